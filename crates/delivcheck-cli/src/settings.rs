//! Runtime settings: optional JSON file, then command-line and environment overrides.

use std::path::Path;

use anyhow::Context;
use delivcheck_core::EngineConfig;
use delivcheck_gateway::GatewayConfig;
use serde::Deserialize;

/// Contents of the `--config` file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub gateway: GatewayConfig,
}

/// Gateway values given on the command line or through `DELIVCHECK_*`.
#[derive(Debug, Clone, Default)]
pub struct GatewayOverrides {
    pub endpoint: Option<String>,
    pub sandbox: bool,
    pub profile: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn apply(&mut self, overrides: GatewayOverrides) {
        let gateway = &mut self.gateway;
        if let Some(endpoint) = overrides.endpoint {
            gateway.endpoint = endpoint;
        }
        gateway.sandbox |= overrides.sandbox;
        if let Some(profile) = overrides.profile {
            gateway.profile = profile;
        }
        if let Some(username) = overrides.username {
            gateway.username = username;
        }
        if let Some(password) = overrides.password {
            gateway.password = password;
        }
        if let Some(secs) = overrides.timeout_secs {
            gateway.timeout = std::time::Duration::from_secs(secs);
        }
    }
}

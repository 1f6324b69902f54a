//! Verification gateway: the boundary to the external address verification service.

use std::time::Duration;

use async_trait::async_trait;
use delivcheck_core::{VerificationRecord, VerificationRequest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpGateway;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("credentials rejected by verification service: {0}")]
    Authentication(String),
    #[error("verification service returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("verification service returned no records for {requested} requests")]
    EmptyResponse { requested: usize },
    #[error("verification call timed out after {0:?}")]
    Timeout(Duration),
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[cfg(feature = "http")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Credentials were rejected. Everything else is a service-side fault.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

/// Submits address batches to the verification service.
///
/// One call per batch. Implementations return one record per request they
/// could resolve, each echoing the request's `record_id`.
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    async fn submit_batch(
        &self,
        requests: &[VerificationRequest],
    ) -> Result<Vec<VerificationRecord>, GatewayError>;
}

/// Connection settings for the verification service, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub endpoint: String,
    /// Used instead of `endpoint` when `sandbox` is set.
    pub sandbox_endpoint: Option<String>,
    pub sandbox: bool,
    /// Named configuration profile on the service side.
    pub profile: String,
    pub username: String,
    pub password: String,
    /// Upper bound for one batch round-trip.
    #[serde(with = "secs")]
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            sandbox_endpoint: None,
            sandbox: false,
            profile: "default".to_string(),
            username: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    /// Base URL for the configured mode, without trailing slash.
    pub fn base_url(&self) -> &str {
        let url = match (&self.sandbox_endpoint, self.sandbox) {
            (Some(sandbox), true) => sandbox.as_str(),
            _ => self.endpoint.as_str(),
        };
        url.trim_end_matches('/')
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_switches_endpoint() {
        let mut config = GatewayConfig {
            endpoint: "https://verify.local/".into(),
            sandbox_endpoint: Some("https://sandbox.verify.local".into()),
            ..GatewayConfig::default()
        };
        assert_eq!(config.base_url(), "https://verify.local");
        config.sandbox = true;
        assert_eq!(config.base_url(), "https://sandbox.verify.local");
    }

    #[test]
    fn sandbox_without_endpoint_falls_back() {
        let config = GatewayConfig {
            sandbox: true,
            ..GatewayConfig::default()
        };
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn config_timeout_in_seconds() {
        let json = r#"{ "profile": "shop-de", "timeout": 5, "sandbox": true }"#;
        let config: GatewayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.profile, "shop-de");
        assert!(config.username.is_empty());
    }

    #[test]
    fn only_authentication_is_authentication() {
        assert!(GatewayError::Authentication("bad".into()).is_authentication());
        assert!(!GatewayError::Timeout(Duration::from_secs(1)).is_authentication());
        assert!(!GatewayError::EmptyResponse { requested: 2 }.is_authentication());
    }
}

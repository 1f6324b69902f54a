//! Engine configuration, passed explicitly at construction.

use serde::{Deserialize, Serialize};

/// When newly placed orders get analysed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisTrigger {
    /// Only on explicit request.
    #[default]
    Manual,
    /// Queued as pending and picked up by the next sweep.
    Cron,
    /// Analysed synchronously when the order is placed.
    OnPlacement,
}

/// Which of hold/cancel is attempted first when both are enabled.
/// The second action only runs if the first did not fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOrder {
    #[default]
    HoldThenCancel,
    CancelThenHold,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Put orders that are not deliverable on hold.
    pub hold_non_deliverable: bool,
    /// Cancel undeliverable orders.
    pub auto_cancel: bool,
    /// Overwrite shipping addresses with the service's suggestion.
    pub auto_update_address: bool,
    pub trigger: AnalysisTrigger,
    pub action_order: ActionOrder,
    /// Country codes the verification service covers.
    pub domestic_countries: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hold_non_deliverable: false,
            auto_cancel: false,
            auto_update_address: false,
            trigger: AnalysisTrigger::Manual,
            action_order: ActionOrder::HoldThenCancel,
            domestic_countries: vec!["DE".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "auto_cancel": true, "trigger": "on_placement" }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert!(config.auto_cancel);
        assert!(!config.hold_non_deliverable);
        assert_eq!(config.trigger, AnalysisTrigger::OnPlacement);
        assert_eq!(config.action_order, ActionOrder::HoldThenCancel);
        assert_eq!(config.domestic_countries, vec!["DE"]);
    }
}

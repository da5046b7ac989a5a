//! Directives emitted by the alert engine
//!
//! Directives are advisory: the engine never pauses or resizes anything
//! itself. Consumers must tolerate duplicates.

use bastion_core::{Alert, PerformanceMetrics};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Directive {
    /// A rule fired
    Alert { alert: Alert },
    /// Halt all trading until an operator resumes it
    #[serde(rename_all = "camelCase")]
    EmergencyStop { alert_id: String, reason: String },
    /// Scale new position sizes by `factor` (0.5 = half)
    #[serde(rename_all = "camelCase")]
    ReducePositionSize { alert_id: String, factor: Decimal },
    /// Open no new trades for `duration_ms`
    #[serde(rename_all = "camelCase")]
    PauseTrading { alert_id: String, duration_ms: u64 },
    /// Raise the minimum entry confidence by `increment` points
    #[serde(rename_all = "camelCase")]
    IncreaseConfidenceThreshold { alert_id: String, increment: Decimal },
    /// Strategy parameters should be re-tuned
    #[serde(rename_all = "camelCase")]
    OptimizeStrategy { alert_id: String, data: PerformanceMetrics },
    /// Risk limits should be tightened
    #[serde(rename_all = "camelCase")]
    TightenRiskManagement { alert_id: String, data: PerformanceMetrics },
    /// Primary exchange path is failing, use the fallback
    #[serde(rename_all = "camelCase")]
    SwitchToFallback { alert_id: String, data: PerformanceMetrics },
    #[serde(rename_all = "camelCase")]
    AlertAcknowledged { alert_id: String },
    #[serde(rename_all = "camelCase")]
    AlertResolved { alert_id: String },
}

impl Directive {
    /// Event name as seen by consumers
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Alert { .. } => "alert",
            Directive::EmergencyStop { .. } => "emergencyStop",
            Directive::ReducePositionSize { .. } => "reducePositionSize",
            Directive::PauseTrading { .. } => "pauseTrading",
            Directive::IncreaseConfidenceThreshold { .. } => "increaseConfidenceThreshold",
            Directive::OptimizeStrategy { .. } => "optimizeStrategy",
            Directive::TightenRiskManagement { .. } => "tightenRiskManagement",
            Directive::SwitchToFallback { .. } => "switchToFallback",
            Directive::AlertAcknowledged { .. } => "alertAcknowledged",
            Directive::AlertResolved { .. } => "alertResolved",
        }
    }

    /// Id of the alert this directive originates from
    pub fn alert_id(&self) -> &str {
        match self {
            Directive::Alert { alert } => &alert.id,
            Directive::EmergencyStop { alert_id, .. }
            | Directive::ReducePositionSize { alert_id, .. }
            | Directive::PauseTrading { alert_id, .. }
            | Directive::IncreaseConfidenceThreshold { alert_id, .. }
            | Directive::OptimizeStrategy { alert_id, .. }
            | Directive::TightenRiskManagement { alert_id, .. }
            | Directive::SwitchToFallback { alert_id, .. }
            | Directive::AlertAcknowledged { alert_id }
            | Directive::AlertResolved { alert_id } => alert_id,
        }
    }

    /// True for directives that change trading behavior (not lifecycle notifications)
    pub fn is_corrective(&self) -> bool {
        !matches!(
            self,
            Directive::Alert { .. }
                | Directive::AlertAcknowledged { .. }
                | Directive::AlertResolved { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_directive_names() {
        let d = Directive::ReducePositionSize {
            alert_id: "a1".to_string(),
            factor: dec!(0.5),
        };
        assert_eq!(d.name(), "reducePositionSize");
        assert_eq!(d.alert_id(), "a1");
        assert!(d.is_corrective());

        let ack = Directive::AlertAcknowledged {
            alert_id: "a2".to_string(),
        };
        assert_eq!(ack.name(), "alertAcknowledged");
        assert!(!ack.is_corrective());
    }

    #[test]
    fn test_tagged_wire_format() {
        let d = Directive::PauseTrading {
            alert_id: "a1".to_string(),
            duration_ms: 3_600_000,
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "pauseTrading");
        assert_eq!(json["alertId"], "a1");
        assert_eq!(json["durationMs"], 3_600_000);

        let back: Directive = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}

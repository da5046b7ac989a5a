use crate::entities::PerformanceMetrics;
use crate::values::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Category of the rule that raised an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    /// Peak-to-trough equity loss
    Drawdown,
    /// Consecutive losing trades
    LosingStreak,
    /// Win rate / Sharpe degradation
    Performance,
    /// Exposure and loss limits
    Risk,
    /// Infrastructure (exchange API) health
    System,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertType::Drawdown => "DRAWDOWN",
            AlertType::LosingStreak => "LOSING_STREAK",
            AlertType::Performance => "PERFORMANCE",
            AlertType::Risk => "RISK",
            AlertType::System => "SYSTEM",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// A fired alert
///
/// Created unacknowledged and unresolved; retained until a cleanup pass
/// removes it (resolved and older than the retention window).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    /// Rule that fired
    pub rule_id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    /// Metrics snapshot that triggered the rule
    pub data: PerformanceMetrics,
    pub timestamp: Timestamp,
    pub acknowledged: bool,
    pub resolved: bool,
    pub resolved_at: Option<Timestamp>,
}

impl Alert {
    pub fn new(
        rule_id: impl Into<String>,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: impl Into<String>,
        data: PerformanceMetrics,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: format!("alert_{}", Uuid::new_v4().simple()),
            rule_id: rule_id.into(),
            alert_type,
            severity,
            message: message.into(),
            data,
            timestamp,
            acknowledged: false,
            resolved: false,
            resolved_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.resolved
    }

    pub fn is_critical(&self) -> bool {
        self.severity == AlertSeverity::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Critical > AlertSeverity::High);
        assert!(AlertSeverity::High > AlertSeverity::Medium);
        assert!(AlertSeverity::Medium > AlertSeverity::Low);
    }

    #[test]
    fn test_new_alert_is_active() {
        let alert = Alert::new(
            "drawdown_alert",
            AlertType::Drawdown,
            AlertSeverity::High,
            "Drawdown 21%",
            PerformanceMetrics::default(),
            Utc::now(),
        );

        assert!(alert.id.starts_with("alert_"));
        assert!(alert.is_active());
        assert!(!alert.acknowledged);
        assert!(!alert.is_critical());
    }

    #[test]
    fn test_alert_ids_unique() {
        let now = Utc::now();
        let a = Alert::new("r", AlertType::System, AlertSeverity::Low, "m", PerformanceMetrics::default(), now);
        let b = Alert::new("r", AlertType::System, AlertSeverity::Low, "m", PerformanceMetrics::default(), now);
        assert_ne!(a.id, b.id);
    }
}

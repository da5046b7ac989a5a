//! Alert statistics and engine status snapshots

use bastion_core::{Alert, AlertSeverity, AlertType, PerformanceThresholds};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregate counts over every stored alert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStats {
    pub total: usize,
    /// Unresolved
    pub active: usize,
    pub acknowledged: usize,
    pub resolved: usize,
    pub by_severity: HashMap<AlertSeverity, usize>,
    pub by_type: HashMap<AlertType, usize>,
    /// Most recently raised alert
    pub last_alert: Option<Alert>,
}

impl AlertStats {
    pub fn from_alerts<'a>(alerts: impl IntoIterator<Item = &'a Alert>) -> Self {
        let mut stats = AlertStats::default();
        for alert in alerts {
            stats.total += 1;
            if alert.is_active() {
                stats.active += 1;
            }
            if alert.acknowledged {
                stats.acknowledged += 1;
            }
            if alert.resolved {
                stats.resolved += 1;
            }
            *stats.by_severity.entry(alert.severity).or_default() += 1;
            *stats.by_type.entry(alert.alert_type).or_default() += 1;

            if stats
                .last_alert
                .as_ref()
                .is_none_or(|last| alert.timestamp >= last.timestamp)
            {
                stats.last_alert = Some(alert.clone());
            }
        }
        stats
    }

    pub fn count_for(&self, severity: AlertSeverity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Engine health snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub active: bool,
    pub rule_count: usize,
    pub active_alerts: usize,
    /// Unresolved CRITICAL alerts
    pub critical_alerts: usize,
    pub thresholds: PerformanceThresholds,
}

//! Alert engine configuration

use crate::error::AlertConfigError;
use bastion_core::PerformanceThresholds;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Configuration for the Alert Engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertEngineConfig {
    /// Limits the default rules compare against
    pub thresholds: PerformanceThresholds,
    /// Cooldown minutes by rule id, overriding the rule's own
    pub cooldown_overrides: HashMap<String, i64>,
    /// API failures tolerated per window before the fallback rule fires
    pub max_api_failures: u32,
    /// How long resolved alerts are kept before cleanup removes them
    pub retention_days: i64,
}

impl Default for AlertEngineConfig {
    fn default() -> Self {
        Self {
            thresholds: PerformanceThresholds::default(),
            cooldown_overrides: HashMap::new(),
            max_api_failures: 3,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl AlertEngineConfig {
    /// Retention window; an out-of-range value falls back to the default
    pub fn retention(&self) -> Duration {
        non_negative(self.retention_days, Duration::try_days)
            .unwrap_or_else(|| Duration::days(DEFAULT_RETENTION_DAYS))
    }

    /// Cooldown override for a rule, if one is set and in range
    pub fn cooldown_override(&self, rule_id: &str) -> Option<Duration> {
        self.cooldown_overrides
            .get(rule_id)
            .and_then(|minutes| non_negative(*minutes, Duration::try_minutes))
    }

    /// Reject overrides and retention that are negative or too large to
    /// represent
    pub fn validate(&self) -> Result<(), AlertConfigError> {
        for (rule_id, minutes) in &self.cooldown_overrides {
            if non_negative(*minutes, Duration::try_minutes).is_none() {
                return Err(AlertConfigError::CooldownOutOfRange {
                    rule_id: rule_id.clone(),
                    minutes: *minutes,
                });
            }
        }
        if non_negative(self.retention_days, Duration::try_days).is_none() {
            return Err(AlertConfigError::RetentionOutOfRange {
                days: self.retention_days,
            });
        }
        Ok(())
    }
}

fn non_negative(value: i64, to_duration: fn(i64) -> Option<Duration>) -> Option<Duration> {
    if value < 0 {
        return None;
    }
    to_duration(value)
}

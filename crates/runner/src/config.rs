//! Governor configuration
//!
//! One JSON document configures every component. Missing sections and
//! fields fall back to their defaults, so `{}` is a valid config.

use crate::error::ConfigError;
use bastion_alerts::AlertEngineConfig;
use bastion_leverage::LeverageConfig;
use bastion_rate_limit::RateLimitConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GovernorConfig {
    pub leverage: LeverageConfig,
    pub rate_limit: RateLimitConfig,
    pub alerts: AlertEngineConfig,
    /// Entry confidence floor before any alert-driven increase
    pub min_confidence: Decimal,
    /// How often resolved alerts are purged
    pub maintenance_interval_secs: u64,
    /// Capacity of the directive and ban channels
    pub channel_capacity: usize,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            leverage: LeverageConfig::default(),
            rate_limit: RateLimitConfig::default(),
            alerts: AlertEngineConfig::default(),
            min_confidence: dec!(60),
            maintenance_interval_secs: 3600,
            channel_capacity: 256,
        }
    }
}

impl GovernorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.alerts.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = GovernorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GovernorConfig::default());
    }

    #[test]
    fn test_nested_override() {
        let config = GovernorConfig::from_json_str(
            r#"{
                "leverage": {"safeMarginRatio": "0.9"},
                "rateLimit": {"throttleSecs": 30},
                "alerts": {"maxApiFailures": 5},
                "minConfidence": 65
            }"#,
        )
        .unwrap();

        assert_eq!(config.leverage.safe_margin_ratio, dec!(0.9));
        assert_eq!(config.rate_limit.throttle_secs, 30);
        assert_eq!(config.rate_limit.window_max("1m"), 24_000);
        assert_eq!(config.alerts.max_api_failures, 5);
        assert_eq!(config.min_confidence, dec!(65));
        assert_eq!(config.channel_capacity, 256);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            GovernorConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_out_of_range_alert_durations_rejected() {
        let err = GovernorConfig::from_json_str(
            r#"{"alerts": {"cooldownOverrides": {"drawdown_alert": 9223372036854775807}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Alerts(_)));
        assert!(err.to_string().contains("drawdown_alert"));

        assert!(matches!(
            GovernorConfig::from_json_str(r#"{"alerts": {"retentionDays": -1}}"#),
            Err(ConfigError::Alerts(_))
        ));
        assert!(GovernorConfig::from_json_str(r#"{"alerts": {"retentionDays": 30}}"#).is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = GovernorConfig::load("/nonexistent/bastion.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bastion.json"));
    }
}

//! Rate-limit configuration
//!
//! Window maxima are one exchange's documented limits (Binance USDT-M
//! futures); other venues need their own table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Max assumed for a window missing from the table
pub const DEFAULT_WINDOW_MAX: u64 = 1000;

/// Longest throttle taken from a 429 `Retry-After` header (one day)
pub const MAX_RETRY_AFTER_SECS: u64 = 86_400;

/// Configuration for the Rate-Limit Governor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitConfig {
    /// Max weight per enforcement window, keyed by lowercase window id ("1m")
    pub window_limits: BTreeMap<String, u64>,
    /// Max used for unknown windows
    pub default_window_max: u64,
    /// Usage percent above which a warning is logged
    pub warn_pct: f64,
    /// Usage percent above which requests are throttled
    pub throttle_pct: f64,
    /// How long a quota-triggered throttle lasts
    pub throttle_secs: u64,
    /// Throttle length on a 429 without a usable Retry-After
    pub default_retry_after_secs: u64,
    /// Header prefix of weight counters (lowercase)
    pub weight_header_prefix: String,
    /// Header prefix of order counters (lowercase)
    pub order_count_header_prefix: String,
    /// Path fragments identifying order placement endpoints
    pub order_endpoints: Vec<String>,
    /// Path fragments identifying position query endpoints
    pub position_endpoints: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let window_limits = [
            ("1s", 1_200),
            ("2s", 2_400),
            ("5s", 6_000),
            ("1m", 24_000),
            ("2m", 48_000),
            ("5m", 120_000),
            ("10m", 240_000),
            ("60s", 72_000),
        ]
        .into_iter()
        .map(|(window, max)| (window.to_string(), max))
        .collect();

        Self {
            window_limits,
            default_window_max: DEFAULT_WINDOW_MAX,
            warn_pct: 80.0,
            throttle_pct: 95.0,
            throttle_secs: 60,
            default_retry_after_secs: 60,
            weight_header_prefix: "x-mbx-used-weight-".to_string(),
            order_count_header_prefix: "x-mbx-order-count-".to_string(),
            order_endpoints: vec!["/fapi/v1/order".to_string()],
            position_endpoints: vec![
                "/fapi/v2/positionRisk".to_string(),
                "/fapi/v3/positionRisk".to_string(),
            ],
        }
    }
}

impl RateLimitConfig {
    /// Max weight for a window id, falling back to the conservative default
    pub fn window_max(&self, window: &str) -> u64 {
        self.window_limits
            .get(&window.to_ascii_lowercase())
            .copied()
            .unwrap_or(self.default_window_max)
    }

    pub fn throttle_duration(&self) -> Duration {
        Duration::from_secs(self.throttle_secs)
    }

    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_table() {
        let config = RateLimitConfig::default();
        assert_eq!(config.window_max("1s"), 1_200);
        assert_eq!(config.window_max("1m"), 24_000);
        assert_eq!(config.window_max("1M"), 24_000);
        assert_eq!(config.window_max("10m"), 240_000);
        assert_eq!(config.window_max("60s"), 72_000);
        assert_eq!(config.window_max("3h"), DEFAULT_WINDOW_MAX);
    }

    #[test]
    fn test_partial_override() {
        let config: RateLimitConfig =
            serde_json::from_str(r#"{"throttlePct": 90.0, "defaultWindowMax": 500}"#).unwrap();
        assert_eq!(config.throttle_pct, 90.0);
        assert_eq!(config.window_max("unknown"), 500);
        assert_eq!(config.throttle_duration(), Duration::from_secs(60));
    }
}

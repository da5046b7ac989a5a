use serde::{Deserialize, Serialize};

/// Consumption of one exchange quota window (e.g. the 1m weight bucket)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub used: u64,
    pub max: u64,
    pub remaining: u64,
    /// used / max * 100
    pub percentage: f64,
}

impl QuotaUsage {
    pub fn new(used: u64, max: u64) -> Self {
        let percentage = if max == 0 {
            100.0
        } else {
            used as f64 / max as f64 * 100.0
        };

        Self {
            used,
            max,
            remaining: max.saturating_sub(used),
            percentage,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Holding-period class of a trade, selects the strategy profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Minutes-long, high conviction
    Scalper,
    /// Intraday
    Day,
    /// Multi-day
    Swing,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Scalper => "scalper",
            Timeframe::Day => "day",
            Timeframe::Swing => "swing",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse riskiness of a leverage decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Classify a leverage value: <=3 LOW, <=8 MEDIUM, otherwise HIGH
    pub fn from_leverage(leverage: u32) -> Self {
        match leverage {
            0..=3 => RiskTier::Low,
            4..=8 => RiskTier::Medium,
            _ => RiskTier::High,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_tier_boundaries() {
        assert_eq!(RiskTier::from_leverage(1), RiskTier::Low);
        assert_eq!(RiskTier::from_leverage(3), RiskTier::Low);
        assert_eq!(RiskTier::from_leverage(4), RiskTier::Medium);
        assert_eq!(RiskTier::from_leverage(8), RiskTier::Medium);
        assert_eq!(RiskTier::from_leverage(9), RiskTier::High);
        assert_eq!(RiskTier::from_leverage(20), RiskTier::High);
    }
}

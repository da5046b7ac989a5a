//! Leverage configuration
//!
//! Strategy profiles and the named constants the sizing engine uses. The
//! defaults match one exchange's USDT-margined futures limits; override them
//! per venue rather than assuming they generalize.

use bastion_core::Timeframe;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Fraction of the available balance a single trade may commit as margin
pub const DEFAULT_SAFE_MARGIN_RATIO: Decimal = dec!(0.95);

/// Volatility (ratio) above which leverage is damped
pub const DEFAULT_HIGH_VOLATILITY_THRESHOLD: Decimal = dec!(0.03);

/// Volatility assumed when there is not enough price history
pub const DEFAULT_VOLATILITY: Decimal = dec!(0.02);

/// Recommended holding period, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureWindow {
    pub min: u32,
    pub max: u32,
    pub target: u32,
}

/// Leverage envelope for one timeframe class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyProfile {
    /// Starting leverage before any adjustment
    pub base_leverage: u32,
    /// Hard ceiling
    pub max_leverage: u32,
    /// Applied to base leverage at very high confidence
    pub confidence_multiplier: Decimal,
    /// Applied when volatility is above the high-volatility threshold
    pub volatility_factor: Decimal,
    /// Recommended holding period
    pub exposure: ExposureWindow,
}

impl StrategyProfile {
    pub fn scalper() -> Self {
        Self {
            base_leverage: 10,
            max_leverage: 20,
            confidence_multiplier: dec!(1.2),
            volatility_factor: dec!(0.9),
            exposure: ExposureWindow {
                min: 5,
                max: 30,
                target: 15,
            },
        }
    }

    pub fn day() -> Self {
        Self {
            base_leverage: 5,
            max_leverage: 10,
            confidence_multiplier: dec!(1.15),
            volatility_factor: dec!(0.85),
            exposure: ExposureWindow {
                min: 60,
                max: 480,
                target: 240,
            },
        }
    }

    pub fn swing() -> Self {
        Self {
            base_leverage: 3,
            max_leverage: 5,
            confidence_multiplier: dec!(1.1),
            volatility_factor: dec!(0.75),
            exposure: ExposureWindow {
                min: 1440,
                max: 10080,
                target: 4320,
            },
        }
    }
}

/// Confidence breakpoints (percent) used for classification and scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfidenceBands {
    /// Minimum confidence for a strong signal to be a scalp
    pub scalper_min: Decimal,
    /// Minimum confidence for a plain BUY/SELL to be a day trade
    pub day_min: Decimal,
    /// At or above: apply the profile's confidence multiplier
    pub high: Decimal,
    /// At or above (and below `high`): scale leverage up linearly
    pub elevated: Decimal,
    /// Below: cut leverage by `low_confidence_factor`
    pub low: Decimal,
    /// Multiplier applied below `low`
    pub low_confidence_factor: Decimal,
    /// Leverage gain per confidence point above `elevated`, as a fraction of 1/100
    pub elevated_slope: Decimal,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self {
            scalper_min: dec!(85),
            day_min: dec!(70),
            high: dec!(90),
            elevated: dec!(75),
            low: dec!(60),
            low_confidence_factor: dec!(0.7),
            elevated_slope: dec!(0.5),
        }
    }
}

/// Configuration for the Leverage Sizing Engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeverageConfig {
    pub scalper: StrategyProfile,
    pub day: StrategyProfile,
    pub swing: StrategyProfile,
    pub confidence: ConfidenceBands,
    /// Volatility above which the profile's volatility factor applies
    pub high_volatility_threshold: Decimal,
    /// Fallback volatility for short price series
    pub default_volatility: Decimal,
    /// Max share of available balance a trade's margin may use
    pub safe_margin_ratio: Decimal,
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self {
            scalper: StrategyProfile::scalper(),
            day: StrategyProfile::day(),
            swing: StrategyProfile::swing(),
            confidence: ConfidenceBands::default(),
            high_volatility_threshold: DEFAULT_HIGH_VOLATILITY_THRESHOLD,
            default_volatility: DEFAULT_VOLATILITY,
            safe_margin_ratio: DEFAULT_SAFE_MARGIN_RATIO,
        }
    }
}

impl LeverageConfig {
    /// Profile for a timeframe class
    pub fn profile(&self, timeframe: Timeframe) -> &StrategyProfile {
        match timeframe {
            Timeframe::Scalper => &self.scalper,
            Timeframe::Day => &self.day,
            Timeframe::Swing => &self.swing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup() {
        let config = LeverageConfig::default();
        assert_eq!(config.profile(Timeframe::Scalper).max_leverage, 20);
        assert_eq!(config.profile(Timeframe::Day).base_leverage, 5);
        assert_eq!(config.profile(Timeframe::Swing).volatility_factor, dec!(0.75));
    }

    #[test]
    fn test_partial_override() {
        let config: LeverageConfig =
            serde_json::from_str(r#"{"safeMarginRatio":"0.9"}"#).unwrap();
        assert_eq!(config.safe_margin_ratio, dec!(0.9));
        assert_eq!(config.scalper, StrategyProfile::scalper());
        assert_eq!(config.confidence.high, dec!(90));
    }
}

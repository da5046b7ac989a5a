//! Leverage Sizing Engine
//!
//! Maps a trade context to a bounded leverage, margin and risk tier:
//! - Classifies the opportunity into a timeframe (scalper / day / swing)
//! - Scales the profile's base leverage by confidence
//! - Damps it in high volatility
//! - Clamps to `[1, profile.max_leverage]`

use crate::config::{ExposureWindow, LeverageConfig};
use crate::volatility::returns_std_dev;
use bastion_core::{RiskTier, Timeframe, TradeContext};
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Result of sizing one opportunity
///
/// Computed fresh per call; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageDecision {
    /// Whole leverage multiple, always >= 1
    pub leverage: u32,
    pub timeframe: Timeframe,
    /// available balance / leverage
    pub margin_required: Decimal,
    /// available balance * leverage
    pub max_position_size: Decimal,
    pub risk_tier: RiskTier,
    /// Human-readable summary of how the leverage was reached
    pub rationale: String,
}

/// Stateless sizing engine
#[derive(Debug, Clone, Default)]
pub struct LeverageEngine {
    config: LeverageConfig,
}

impl LeverageEngine {
    pub fn new(config: LeverageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LeverageConfig {
        &self.config
    }

    /// Classify an opportunity
    ///
    /// Strong signals with high confidence are scalps, plain directional
    /// signals with decent confidence are day trades, everything else swings.
    pub fn determine_timeframe(&self, context: &TradeContext) -> Timeframe {
        let bands = &self.config.confidence;
        if context.confidence >= bands.scalper_min && context.signal.is_strong() {
            Timeframe::Scalper
        } else if context.confidence >= bands.day_min && context.signal.is_directional() {
            Timeframe::Day
        } else {
            Timeframe::Swing
        }
    }

    /// Compute the leverage proposal for an opportunity
    pub fn calculate_optimal_leverage(&self, context: &TradeContext) -> LeverageDecision {
        let timeframe = self.determine_timeframe(context);
        let profile = self.config.profile(timeframe);
        let bands = &self.config.confidence;
        let max = Decimal::from(profile.max_leverage);

        let mut leverage = Decimal::from(profile.base_leverage);
        let mut steps = Vec::new();

        if context.confidence >= bands.high {
            leverage = leverage.saturating_mul(profile.confidence_multiplier).min(max);
            steps.push(format!("high confidence x{}", profile.confidence_multiplier));
        } else if context.confidence >= bands.elevated {
            let boost = Decimal::ONE.saturating_add(
                ((context.confidence - bands.elevated) / dec!(100)).saturating_mul(bands.elevated_slope),
            );
            leverage = leverage.saturating_mul(boost);
            steps.push(format!("elevated confidence x{:.3}", boost));
        } else if context.confidence < bands.low {
            leverage = leverage.saturating_mul(bands.low_confidence_factor);
            steps.push(format!("low confidence x{}", bands.low_confidence_factor));
        }

        if context.volatility > self.config.high_volatility_threshold {
            leverage = leverage.saturating_mul(profile.volatility_factor);
            steps.push(format!("high volatility x{}", profile.volatility_factor));
        }

        let leverage = leverage
            .max(Decimal::ONE)
            .min(max)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(1)
            .max(1);

        // Saturates for balances near the Decimal limit
        let lev = Decimal::from(leverage);
        let margin_required = context.available_balance / lev;
        let max_position_size = context.available_balance.saturating_mul(lev);
        let risk_tier = RiskTier::from_leverage(leverage);

        let adjustments = if steps.is_empty() {
            "no adjustment".to_string()
        } else {
            steps.join(", ")
        };
        let rationale = format!(
            "{} {} at {}% confidence, volatility {:.2}%: {} profile base {}x (max {}x), {} => {}x ({} risk)",
            context.symbol,
            context.signal,
            context.confidence,
            context.volatility.saturating_mul(dec!(100)),
            timeframe,
            profile.base_leverage,
            profile.max_leverage,
            adjustments,
            leverage,
            risk_tier,
        );

        debug!("[LEVERAGE] {}", rationale);

        LeverageDecision {
            leverage,
            timeframe,
            margin_required,
            max_position_size,
            risk_tier,
            rationale,
        }
    }

    /// Is there room to commit `required_margin` from `available_balance`?
    ///
    /// The number of open positions is not capped; only the margin buffer
    /// matters. An empty (or negative) balance never admits a trade.
    pub fn can_open_trade(
        &self,
        available_balance: Decimal,
        required_margin: Decimal,
        open_positions: usize,
    ) -> bool {
        if available_balance <= Decimal::ZERO {
            debug!("[LEVERAGE] No balance available ({} open positions)", open_positions);
            return false;
        }

        let safe_margin = available_balance.saturating_mul(self.config.safe_margin_ratio);
        let allowed = required_margin <= safe_margin;
        debug!(
            "[LEVERAGE] Margin check: required {} vs safe {} ({} open positions) => {}",
            required_margin, safe_margin, open_positions, allowed
        );
        allowed
    }

    /// Standard deviation of simple returns, or the configured default for
    /// series shorter than two usable prices
    pub fn calculate_volatility(&self, prices: &[Decimal]) -> Decimal {
        returns_std_dev(prices).unwrap_or(self.config.default_volatility)
    }

    /// Recommended holding period for a timeframe class
    pub fn recommended_exposure_time(&self, timeframe: Timeframe) -> ExposureWindow {
        self.config.profile(timeframe).exposure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::Signal;

    fn engine() -> LeverageEngine {
        LeverageEngine::default()
    }

    fn ctx(confidence: Decimal, signal: Signal) -> TradeContext {
        TradeContext::new("BTCUSDT", confidence, signal).with_balance(dec!(1000))
    }

    #[test]
    fn test_determine_timeframe() {
        let e = engine();
        assert_eq!(e.determine_timeframe(&ctx(dec!(90), Signal::StrongBuy)), Timeframe::Scalper);
        assert_eq!(e.determine_timeframe(&ctx(dec!(85), Signal::StrongSell)), Timeframe::Scalper);
        assert_eq!(e.determine_timeframe(&ctx(dec!(75), Signal::Buy)), Timeframe::Day);
        assert_eq!(e.determine_timeframe(&ctx(dec!(70), Signal::Sell)), Timeframe::Day);
        assert_eq!(e.determine_timeframe(&ctx(dec!(50), Signal::Hold)), Timeframe::Swing);
    }

    #[test]
    fn test_strong_signal_below_scalper_band_is_swing() {
        // Strong labels are not "plain" directional, so they never fall into day
        let e = engine();
        assert_eq!(e.determine_timeframe(&ctx(dec!(80), Signal::StrongBuy)), Timeframe::Swing);
        assert_eq!(e.determine_timeframe(&ctx(dec!(95), Signal::Hold)), Timeframe::Swing);
    }

    #[test]
    fn test_high_confidence_scalp() {
        // 10 * 1.2 = 12
        let d = engine().calculate_optimal_leverage(&ctx(dec!(92), Signal::StrongBuy));
        assert_eq!(d.timeframe, Timeframe::Scalper);
        assert_eq!(d.leverage, 12);
        assert_eq!(d.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_elevated_confidence_scales_linearly() {
        // day: 5 * (1 + 10/100 * 0.5) = 5.25 -> 5
        let d = engine().calculate_optimal_leverage(&ctx(dec!(85), Signal::Buy));
        assert_eq!(d.timeframe, Timeframe::Day);
        assert_eq!(d.leverage, 5);

        // scalper: 10 * (1 + 13/100 * 0.5) = 10.65 -> 11
        let d = engine().calculate_optimal_leverage(&ctx(dec!(88), Signal::StrongSell));
        assert_eq!(d.leverage, 11);
    }

    #[test]
    fn test_low_confidence_cut() {
        // swing: 3 * 0.7 = 2.1 -> 2
        let d = engine().calculate_optimal_leverage(&ctx(dec!(40), Signal::Hold));
        assert_eq!(d.timeframe, Timeframe::Swing);
        assert_eq!(d.leverage, 2);
        assert_eq!(d.risk_tier, RiskTier::Low);
    }

    #[test]
    fn test_volatility_damping() {
        // scalper at 90: 12 * 0.9 = 10.8 -> 11
        let calm = ctx(dec!(90), Signal::StrongBuy).with_volatility(dec!(0.03));
        let wild = ctx(dec!(90), Signal::StrongBuy).with_volatility(dec!(0.031));

        assert_eq!(engine().calculate_optimal_leverage(&calm).leverage, 12);
        assert_eq!(engine().calculate_optimal_leverage(&wild).leverage, 11);
    }

    #[test]
    fn test_midpoint_rounds_up() {
        // day at exactly 75: 5 * 1.0 = 5
        let d = engine().calculate_optimal_leverage(&ctx(dec!(75), Signal::Buy));
        assert_eq!(d.leverage, 5);

        // scalper at 85: 10 * (1 + 0.05) = 10.5 -> 11 (not banker's 10)
        let d = engine().calculate_optimal_leverage(&ctx(dec!(85), Signal::StrongBuy));
        assert_eq!(d.leverage, 11);
    }

    #[test]
    fn test_margin_and_position_size() {
        let d = engine().calculate_optimal_leverage(&ctx(dec!(92), Signal::StrongBuy));
        assert_eq!(d.margin_required, dec!(1000) / dec!(12));
        assert_eq!(d.max_position_size, dec!(12000));
    }

    #[test]
    fn test_extreme_balance_saturates() {
        let balance = Decimal::MAX / dec!(2);
        let context = TradeContext::new("BTCUSDT", dec!(92), Signal::StrongBuy)
            .with_balance(balance)
            .with_volatility(Decimal::MAX);

        let d = engine().calculate_optimal_leverage(&context);
        assert_eq!(d.leverage, 11);
        assert_eq!(d.margin_required, balance / dec!(11));
        assert_eq!(d.max_position_size, Decimal::MAX);
        assert!(engine().can_open_trade(balance, d.margin_required, 0));
    }

    #[test]
    fn test_zero_balance_degrades() {
        let context = TradeContext::new("BTCUSDT", dec!(92), Signal::StrongBuy);
        let d = engine().calculate_optimal_leverage(&context);
        assert_eq!(d.margin_required, Decimal::ZERO);
        assert_eq!(d.max_position_size, Decimal::ZERO);
        assert!(d.leverage >= 1);
    }

    #[test]
    fn test_rationale_mentions_inputs() {
        let d = engine().calculate_optimal_leverage(
            &ctx(dec!(92), Signal::StrongBuy).with_volatility(dec!(0.05)),
        );
        assert!(d.rationale.contains("BTCUSDT"));
        assert!(d.rationale.contains("STRONG_BUY"));
        assert!(d.rationale.contains("scalper"));
        assert!(d.rationale.contains("high volatility"));
    }

    #[test]
    fn test_can_open_trade_boundary() {
        let e = engine();
        assert!(!e.can_open_trade(dec!(100), dec!(96), 0));
        assert!(e.can_open_trade(dec!(100), dec!(94), 0));
        assert!(e.can_open_trade(dec!(100), dec!(95), 0));
        // position count is not a constraint
        assert!(e.can_open_trade(dec!(100), dec!(94), 250));
        assert!(!e.can_open_trade(Decimal::ZERO, Decimal::ZERO, 0));
    }

    #[test]
    fn test_volatility_default() {
        let e = engine();
        assert_eq!(e.calculate_volatility(&[dec!(100)]), dec!(0.02));
        assert_eq!(e.calculate_volatility(&[]), dec!(0.02));
        assert!(e.calculate_volatility(&[dec!(100), dec!(110), dec!(90)]) > Decimal::ZERO);
    }

    #[test]
    fn test_exposure_windows() {
        let e = engine();
        let scalp = e.recommended_exposure_time(Timeframe::Scalper);
        assert_eq!((scalp.min, scalp.max, scalp.target), (5, 30, 15));
        let day = e.recommended_exposure_time(Timeframe::Day);
        assert_eq!((day.min, day.max, day.target), (60, 480, 240));
        let swing = e.recommended_exposure_time(Timeframe::Swing);
        assert_eq!((swing.min, swing.max, swing.target), (1440, 10080, 4320));
    }
}

//! Sizing invariants over a sweep of trade contexts
//!
//! For every combination of confidence, signal, volatility and balance the
//! engine must stay inside the profile envelope and keep the margin identity.

use bastion_core::{Signal, TradeContext};
use bastion_leverage::{LeverageConfig, LeverageEngine};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const SIGNALS: [Signal; 5] = [
    Signal::StrongBuy,
    Signal::Buy,
    Signal::Hold,
    Signal::Sell,
    Signal::StrongSell,
];

fn sweep() -> Vec<TradeContext> {
    let mut contexts = Vec::new();
    for confidence in (0..=100).step_by(5) {
        for signal in SIGNALS {
            for volatility in [dec!(0), dec!(0.01), dec!(0.03), dec!(0.031), dec!(0.5)] {
                for balance in [dec!(0), dec!(10), dec!(1234.56)] {
                    contexts.push(
                        TradeContext::new("SOLUSDT", Decimal::from(confidence), signal)
                            .with_volatility(volatility)
                            .with_balance(balance),
                    );
                }
            }
        }
    }
    contexts
}

#[test]
fn test_leverage_within_profile_bounds() {
    let engine = LeverageEngine::default();
    let config = LeverageConfig::default();

    for context in sweep() {
        let decision = engine.calculate_optimal_leverage(&context);
        let max = config.profile(decision.timeframe).max_leverage;

        assert!(
            decision.leverage >= 1 && decision.leverage <= max,
            "leverage {} outside [1, {}] for {:?}",
            decision.leverage,
            max,
            context
        );
    }
}

#[test]
fn test_margin_identity() {
    let engine = LeverageEngine::default();

    for context in sweep() {
        let decision = engine.calculate_optimal_leverage(&context);
        let leverage = Decimal::from(decision.leverage);

        assert_eq!(decision.margin_required, context.available_balance / leverage);
        assert_eq!(decision.max_position_size, context.available_balance * leverage);
    }
}

#[test]
fn test_deterministic() {
    let engine = LeverageEngine::default();
    let context = TradeContext::new("BTCUSDT", dec!(93), Signal::StrongSell)
        .with_volatility(dec!(0.04))
        .with_balance(dec!(500));

    let first = engine.calculate_optimal_leverage(&context);
    let second = engine.calculate_optimal_leverage(&context);
    assert_eq!(first, second);
}

#[test]
fn test_custom_profile_ceiling() {
    let mut config = LeverageConfig::default();
    config.scalper.max_leverage = 8;
    let engine = LeverageEngine::new(config);

    let decision = engine.calculate_optimal_leverage(
        &TradeContext::new("BTCUSDT", dec!(99), Signal::StrongBuy).with_balance(dec!(100)),
    );
    assert_eq!(decision.leverage, 8);
}

#[test]
fn test_open_trade_with_proposed_margin() {
    let _ = env_logger::try_init();
    let engine = LeverageEngine::default();

    let decision = engine.calculate_optimal_leverage(
        &TradeContext::new("BTCUSDT", dec!(92), Signal::StrongBuy).with_balance(dec!(1000)),
    );
    // margin is a twelfth of the balance, well inside the buffer
    assert!(engine.can_open_trade(dec!(1000), decision.margin_required, 3));
}

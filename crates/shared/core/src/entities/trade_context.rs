use crate::entities::Signal;
use crate::values::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the sizing engine needs to know about one trade opportunity
///
/// Built by the trading loop from the analyzers' output, evaluated once
/// and then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeContext {
    /// Instrument
    pub symbol: Symbol,
    /// Final confidence percentage (0 - 100)
    pub confidence: Decimal,
    /// Consolidated signal label
    pub signal: Signal,
    /// Free-form timeframe hint from the analyzers (informational)
    #[serde(default)]
    pub timeframe_hint: Option<String>,
    /// Recent volatility as a ratio (0.03 = 3%)
    #[serde(default)]
    pub volatility: Decimal,
    /// Balance available for margin
    #[serde(default)]
    pub available_balance: Decimal,
    /// Leverage currently set on the symbol, if any
    #[serde(default)]
    pub current_leverage: Option<u32>,
}

impl TradeContext {
    /// Create a context with zero volatility and balance
    pub fn new(symbol: impl Into<Symbol>, confidence: Decimal, signal: Signal) -> Self {
        Self {
            symbol: symbol.into(),
            confidence,
            signal,
            timeframe_hint: None,
            volatility: Decimal::ZERO,
            available_balance: Decimal::ZERO,
            current_leverage: None,
        }
    }

    pub fn with_volatility(mut self, volatility: Decimal) -> Self {
        self.volatility = volatility;
        self
    }

    pub fn with_balance(mut self, available_balance: Decimal) -> Self {
        self.available_balance = available_balance;
        self
    }

    pub fn with_timeframe_hint(mut self, hint: impl Into<String>) -> Self {
        self.timeframe_hint = Some(hint.into());
        self
    }

    pub fn with_current_leverage(mut self, leverage: u32) -> Self {
        self.current_leverage = Some(leverage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder() {
        let ctx = TradeContext::new("BTCUSDT", dec!(82), Signal::Buy)
            .with_volatility(dec!(0.025))
            .with_balance(dec!(1000))
            .with_current_leverage(5);

        assert_eq!(ctx.symbol, "BTCUSDT");
        assert_eq!(ctx.volatility, dec!(0.025));
        assert_eq!(ctx.available_balance, dec!(1000));
        assert_eq!(ctx.current_leverage, Some(5));
        assert!(ctx.timeframe_hint.is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let ctx: TradeContext = serde_json::from_str(
            r#"{"symbol":"ETHUSDT","confidence":"91","signal":"STRONG_BUY","availableBalance":"250"}"#,
        )
        .unwrap();

        assert_eq!(ctx.signal, Signal::StrongBuy);
        assert_eq!(ctx.confidence, dec!(91));
        assert_eq!(ctx.available_balance, dec!(250));
        assert_eq!(ctx.volatility, Decimal::ZERO);
    }
}

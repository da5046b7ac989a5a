use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Aggregated live performance pushed by the trading loop
///
/// Fields are optional: a push only carries what the loop measured this
/// cycle, and rules whose input is absent do not fire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceMetrics {
    /// Peak-to-trough drawdown in percent (15 = 15%)
    pub drawdown_pct: Option<Decimal>,
    /// Current streak of losing trades
    pub consecutive_losses: Option<u32>,
    /// Win rate in percent
    pub win_rate_pct: Option<Decimal>,
    /// Realized loss today, in account currency (positive number)
    pub daily_loss: Option<Decimal>,
    /// Rolling Sharpe ratio
    pub sharpe_ratio: Option<Decimal>,
    /// Largest position as percent of balance
    pub position_size_pct: Option<Decimal>,
    /// Failed exchange calls in the current window
    pub api_failures: Option<u32>,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drawdown(mut self, pct: Decimal) -> Self {
        self.drawdown_pct = Some(pct);
        self
    }

    pub fn with_consecutive_losses(mut self, losses: u32) -> Self {
        self.consecutive_losses = Some(losses);
        self
    }

    pub fn with_win_rate(mut self, pct: Decimal) -> Self {
        self.win_rate_pct = Some(pct);
        self
    }

    pub fn with_daily_loss(mut self, loss: Decimal) -> Self {
        self.daily_loss = Some(loss);
        self
    }

    pub fn with_sharpe_ratio(mut self, sharpe: Decimal) -> Self {
        self.sharpe_ratio = Some(sharpe);
        self
    }

    pub fn with_position_size(mut self, pct: Decimal) -> Self {
        self.position_size_pct = Some(pct);
        self
    }

    pub fn with_api_failures(mut self, failures: u32) -> Self {
        self.api_failures = Some(failures);
        self
    }
}

/// Limits the alert rules compare live metrics against
///
/// Mutable at runtime; changes apply on the next evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceThresholds {
    /// Drawdown percent above which the drawdown rule fires
    pub max_drawdown: Decimal,
    /// Losing streak length at which the streak rule fires
    pub max_consecutive_losses: u32,
    /// Win rate percent below which the performance rule fires
    pub min_win_rate: Decimal,
    /// Daily loss above which the daily-loss rule fires
    pub max_daily_loss: Decimal,
    /// Sharpe ratio below which the Sharpe rule fires
    pub min_sharpe_ratio: Decimal,
    /// Position size (percent of balance) above which the sizing rule fires
    pub max_position_size: Decimal,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            max_drawdown: dec!(15),
            max_consecutive_losses: 5,
            min_win_rate: dec!(40),
            max_daily_loss: dec!(5),
            min_sharpe_ratio: dec!(1.0),
            max_position_size: dec!(20),
        }
    }
}

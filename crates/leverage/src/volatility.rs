//! Volatility Estimator
//!
//! Dispersion of simple returns over a price series.

use rust_decimal::{Decimal, MathematicalOps};

/// Population standard deviation of simple returns
///
/// Returns `None` when the series yields no return (fewer than two prices,
/// or every prior price is zero).
pub fn returns_std_dev(prices: &[Decimal]) -> Option<Decimal> {
    let returns: Vec<Decimal> = prices
        .windows(2)
        .filter(|w| !w[0].is_zero())
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();

    if returns.is_empty() {
        return None;
    }

    let n = Decimal::from(returns.len());
    let mean = returns.iter().sum::<Decimal>() / n;
    let variance = returns
        .iter()
        .map(|r| {
            let d = *r - mean;
            d * d
        })
        .sum::<Decimal>()
        / n;

    variance.sqrt()
}

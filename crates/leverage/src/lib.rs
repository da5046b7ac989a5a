//! Bastion Leverage Sizing
//!
//! Turns a trade opportunity into a bounded leverage proposal:
//!
//! ```text
//!  TradeContext ──► Timeframe ──► StrategyProfile
//!  (confidence,        │               │ base / max leverage
//!   signal,            ▼               ▼
//!   volatility,   confidence scaling ─► volatility damping ─► clamp [1, max]
//!   balance)                                                     │
//!                                                                ▼
//!                                     LeverageDecision (leverage, margin, tier)
//! ```
//!
//! Everything here is pure and total: degenerate inputs (too little price
//! history, zero balance) fall back to documented defaults instead of
//! returning errors.

pub mod config;
pub mod engine;
pub mod volatility;

// Re-export main types
pub use config::{ConfidenceBands, ExposureWindow, LeverageConfig, StrategyProfile};
pub use engine::{LeverageDecision, LeverageEngine};
pub use volatility::returns_std_dev;

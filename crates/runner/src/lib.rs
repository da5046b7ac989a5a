//! Bastion Runner - Execution Governor
//!
//! Wires the three governor components into one service object with an
//! explicit start/shutdown lifecycle:
//!
//! ```text
//!  TradeContext ──► evaluate() ──► controls ─► rate limit ─► sizing ─► margin check
//!                                     ▲            ▲
//!                     directives      │            │ ban notice
//!  Metrics ──► Alert Engine ──────────┘            │
//!                                                  │
//!  Exchange responses ──► Rate-Limit Governor ─────┘
//!
//!  Outgoing requests ──► admit() ──► Rate-Limit Governor (critical calls always pass)
//! ```
//!
//! Directives from [`ExecutionGovernor::push_metrics`] and bans seen by
//! [`ExecutionGovernor::record_response`] reach [`TradingControls`] before
//! those calls return.
//!
//! Background tasks (spawned by [`ExecutionGovernor::start`]):
//! - ban listener halting trading on a ban reported through the bus
//! - maintenance purging old resolved alerts

pub mod config;
pub mod controls;
pub mod error;
pub mod governor;
pub mod session;

// Re-export main types
pub use config::GovernorConfig;
pub use controls::{ControlsSnapshot, HaltCause, TradingControls};
pub use error::{ConfigError, GovernorError, Result};
pub use governor::{ExecutionGovernor, GovernorStatus};
pub use session::{Session, SessionStep, StepOutcome, replay, settle};

//! Bastion Risk Alert & Mitigation Engine
//!
//! Watches live trading performance and drives automatic risk reduction:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Alert Engine                            │
//! │                                                             │
//! │  Metrics push ───► Rules (cooldown-gated) ───► Alerts      │
//! │                                                 │           │
//! │                              Rule actions ◄─────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!         Directive channel (alert, emergencyStop, pauseTrading, ...)
//!                              │
//!                              ▼
//!                   Trading loop / UI layer
//! ```
//!
//! ## Default rules
//!
//! | Rule | Fires when | Severity | Cooldown | Action |
//! |------|-----------|----------|----------|--------|
//! | drawdown | drawdown > max | CRITICAL >25, HIGH >20, else MEDIUM | 30m | stop / halve size |
//! | losing streak | losses >= max | CRITICAL >=7, else HIGH | 15m | pause 1h / +10 confidence |
//! | low performance | win rate < min | HIGH <25, else MEDIUM | 60m | optimize strategy |
//! | daily loss | loss > max | CRITICAL >10, else HIGH | 5m | tighten risk |
//! | low Sharpe | Sharpe < min | HIGH <0.5, else MEDIUM | 120m | optimize strategy |
//! | position size | size > max | CRITICAL >30, else HIGH | 10m | tighten risk |
//! | API failures | failures > 3 | MEDIUM | 5m | switch to fallback |

pub mod config;
pub mod engine;
pub mod error;
pub mod rules;
pub mod stats;

// Re-export main types
pub use config::AlertEngineConfig;
pub use engine::{AlertEngine, Evaluation};
pub use error::{AlertConfigError, Result, RuleError};
pub use rules::{AlertRule, SeverityResolver, default_rules};
pub use stats::{AlertStats, EngineStatus};

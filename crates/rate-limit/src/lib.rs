//! Bastion Rate-Limit Governor
//!
//! Keeps the trading process inside the exchange's request quotas:
//!
//! ```text
//!            ┌──────── quota > 95% / HTTP 429 ────────┐
//!            │                                         ▼
//!        ┌──────┐ ◄──── blockUntil elapsed ──── ┌───────────┐
//!        │ Open │                                │ Throttled │
//!        └──────┘                                └───────────┘
//!            │          HTTP 418                       │
//!            └──────────────►┌────────┐◄───────────────┘
//!                            │ Banned │ ── operator reset ──► Open
//!                            └────────┘
//! ```
//!
//! Every exchange response is fed back through
//! [`RateLimitGovernor::check_rate_limit`]; every outgoing request asks
//! [`RateLimitGovernor::should_block`] first. Position-closing orders and
//! position queries are never blocked, whatever the state.

pub mod config;
pub mod error;
pub mod governor;
pub mod request;
pub mod state;

// Re-export main types
pub use config::{MAX_RETRY_AFTER_SECS, RateLimitConfig};
pub use error::{RateLimitError, Result};
pub use governor::{RateLimitGovernor, RateLimitStatus};
pub use request::{ExchangeRequest, ExchangeResponse, HttpMethod};
pub use state::{BlockRemaining, BlockState};

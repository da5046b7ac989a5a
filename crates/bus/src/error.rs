//! Error types for the bus crate

use thiserror::Error;

/// Transport-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Channel closed")]
    ChannelClosed,

    #[error("No active subscribers")]
    NoSubscribers,

    #[error("Subscriber lagged, {0} messages dropped")]
    Lagged(u64),
}

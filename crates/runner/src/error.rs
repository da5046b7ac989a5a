//! Runner errors

use bastion_core::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;

/// Why the governor refused a trade or an outgoing request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GovernorError {
    #[error("IP banned by exchange, only position-closing calls allowed")]
    Banned,

    #[error("Rate limited for another {}s", .remaining.num_seconds())]
    Throttled { remaining: chrono::Duration },

    #[error("Trading halted: {reason}")]
    TradingHalted { reason: String },

    #[error("Trading paused until {until}")]
    TradingPaused { until: Timestamp },

    #[error("Confidence {confidence} below threshold {threshold}")]
    BelowConfidenceThreshold {
        confidence: Decimal,
        threshold: Decimal,
    },

    #[error("Insufficient margin: required {required}, available {available}")]
    InsufficientMargin {
        required: Decimal,
        available: Decimal,
    },
}

/// Configuration and session file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid alerts config: {0}")]
    Alerts(#[from] bastion_alerts::AlertConfigError),
}

pub type Result<T> = std::result::Result<T, GovernorError>;

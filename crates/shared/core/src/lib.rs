//! Bastion Core Domain
//!
//! Pure domain types shared by the execution governor components.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Alerting
    Alert,
    AlertSeverity,
    AlertType,
    // Performance monitoring
    PerformanceMetrics,
    PerformanceThresholds,
    // Exchange quota
    QuotaUsage,
    // Sizing
    RiskTier,
    Signal,
    Timeframe,
    TradeContext,
};
pub use values::{Symbol, Timestamp};

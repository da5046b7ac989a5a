//! Alert engine errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A rule predicate could not be evaluated against the metrics
    #[error("Rule {rule_id} predicate failed: {reason}")]
    Predicate { rule_id: String, reason: String },

    #[error("Unknown rule: {0}")]
    UnknownRule(String),
}

/// Engine configuration values that cannot be represented as durations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertConfigError {
    #[error("Cooldown override for {rule_id} out of range: {minutes} minutes")]
    CooldownOutOfRange { rule_id: String, minutes: i64 },

    #[error("Alert retention out of range: {days} days")]
    RetentionOutOfRange { days: i64 },
}

pub type Result<T> = std::result::Result<T, RuleError>;

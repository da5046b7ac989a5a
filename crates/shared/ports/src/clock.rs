use bastion_core::Timestamp;

/// Port for time abstraction
///
/// Cooldowns, throttle windows and alert retention all read time through
/// this trait so tests can drive them with a manual clock:
/// - Real system time for production
/// - Fixed, manually advanced time for deterministic tests
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}

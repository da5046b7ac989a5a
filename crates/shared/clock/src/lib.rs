//! Bastion Clock Infrastructure
//!
//! Time sources for the governor components:
//!
//! - [`SystemClock`]: wall-clock time for production
//! - [`ManualClock`]: frozen time that only moves when told to, for
//!   stepping through cooldowns and throttle windows in tests
//!
//! ## Usage
//!
//! ```ignore
//! use bastion_clock::{ManualClock, Clock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(None);
//! let t0 = clock.now();
//! clock.advance(Duration::minutes(31));
//! assert_eq!(clock.now() - t0, Duration::minutes(31));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use bastion_ports::Clock;

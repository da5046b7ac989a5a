//! Bastion Ports
//!
//! Port definitions (traits) for the execution governor.
//! These define the boundaries between domain logic and infrastructure.

mod clock;

pub use clock::Clock;

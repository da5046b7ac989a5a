//! Bastion Bus
//!
//! In-process publish/subscribe plumbing for the execution governor:
//! - Transport abstraction (tokio broadcast channels behind `Publisher`/`Subscriber` traits)
//! - Wire messages emitted by the governor components
//!
//! ## Channels
//!
//! ```text
//!   Alert Engine ──► Directive ──┐
//!                                ├──► trading loop, UI layer, ...
//!   Rate-Limit Governor ──► BanNotice ──┘
//! ```
//!
//! Every subscriber sees every message. Delivery is advisory: consumers are
//! expected to apply the same directive twice without harm.

pub mod error;
pub mod messages;
pub mod transport;

// Re-export commonly used types
pub use error::TransportError;
pub use messages::{BanNotice, Directive};
pub use transport::{
    Publisher, Subscriber,
    channel::{ChannelPublisher, ChannelSubscriber},
};

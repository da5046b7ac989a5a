//! Wire message types for the governor bus

pub mod ban;
pub mod directive;

pub use ban::BanNotice;
pub use directive::Directive;

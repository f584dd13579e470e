//! # slotwise_core
//!
//! Core domain logic for Slotwise: interval arithmetic, availability
//! computation, request rate limiting, and double opt-in tokens.

pub mod availability;
pub mod busy;
pub mod clock;
pub mod contacts;
pub mod interval;
pub mod ratelimit;
pub mod token;
pub mod verify;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

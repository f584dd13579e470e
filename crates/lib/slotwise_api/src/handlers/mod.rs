//! Request handlers.

pub mod availability;
pub mod confirm;
pub mod health;
pub mod subscribe;

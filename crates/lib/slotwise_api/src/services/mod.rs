//! Request-level services shared by handlers.

pub mod client_key;
pub mod subscribe;

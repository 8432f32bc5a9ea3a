//! Admin console route handlers.

pub mod auth;
pub mod console;

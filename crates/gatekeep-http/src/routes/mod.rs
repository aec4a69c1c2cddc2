//! HTTP API route handlers.

pub mod login;
pub mod system;

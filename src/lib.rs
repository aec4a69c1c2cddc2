//! Gatekeep Server: a login endpoint guarded against request floods and
//! credential guessing.
//!
//! The decision engine lives in `gatekeep-service`; the HTTP surface in
//! `gatekeep-http`. This crate owns configuration and process startup.

pub mod config;

pub use gatekeep_http::{AppState, router};
pub use gatekeep_service::ServiceState;

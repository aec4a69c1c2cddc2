//! Service-layer error types.
//!
//! Policy rejections (blocked, rate-limited, failed login) are not errors;
//! they are returned as [`Verdict`](crate::engine::Verdict) and
//! [`LoginOutcome`](crate::engine::LoginOutcome) values. `ServiceError` only
//! covers collaborator and configuration faults.

/// Service error shared across all transports.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The ban store could not answer or could not persist a ban.
    #[error("ban store unavailable: {0}")]
    Storage(String),

    /// A policy threshold is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

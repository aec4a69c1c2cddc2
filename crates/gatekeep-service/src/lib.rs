//! Gatekeep Service: the access decision engine behind the gatekeep server.
//!
//! This crate contains all transport-agnostic logic: the permanent ban set,
//! per-IP rate windows, failed-login tracking, credential verification and
//! metrics. The `gatekeep-http` crate depends on it and supplies client
//! addresses and wire formats.
//!
//! **Zero transport dependencies**: no axum, no HTTP types.

pub mod auth;
pub mod ban;
pub mod engine;
pub mod error;
pub mod login_attempts;
pub mod metrics;
pub mod rate_limit;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use auth::StaticCredentials;
use ban::BanSet;
use engine::{AccessEngine, AccessPolicy};
use error::ServiceError;

/// Configuration subset relevant to the service layer.
///
/// Transport-specific config (bind address, CORS origins, proxy trust)
/// stays in the binary crate's `Config` struct.
pub struct ServiceConfig {
    pub policy: AccessPolicy,
    pub login_user: String,
    pub login_password: String,
    /// Addresses banned before the first request is served.
    pub blocked_ips: Vec<IpAddr>,
    /// Allow requests when the ban store cannot be read.
    pub fail_open: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            policy: AccessPolicy::default(),
            login_user: "user".to_string(),
            login_password: "pass".to_string(),
            blocked_ips: Vec::new(),
            fail_open: false,
        }
    }
}

/// Shared service state, cloneable across all transport handlers.
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<Inner>,
}

struct Inner {
    engine: AccessEngine,
    start_time: Instant,
}

impl ServiceState {
    /// Creates a new service state from config, seeding the ban set.
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        config.policy.validate()?;

        let engine = AccessEngine::new(
            config.policy,
            Arc::new(BanSet::new()),
            Arc::new(StaticCredentials::new(
                config.login_user.clone(),
                config.login_password.clone(),
            )),
        )
        .with_fail_open(config.fail_open);

        let seeded = engine.preload_bans(&config.blocked_ips);
        if seeded > 0 {
            tracing::info!(seeded, "Preloaded banned IPs");
        }

        Ok(Self::from_engine(engine))
    }

    /// Wraps an already-built engine (custom ban store or credential check).
    pub fn from_engine(engine: AccessEngine) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                start_time: Instant::now(),
            }),
        }
    }

    /// Creates an in-memory state with default thresholds (for tests and
    /// ephemeral use).
    pub fn new_in_memory() -> Self {
        Self::new_in_memory_with_policy(AccessPolicy::default())
    }

    /// Creates an in-memory state with custom thresholds (for tests).
    pub fn new_in_memory_with_policy(policy: AccessPolicy) -> Self {
        Self::from_engine(AccessEngine::in_memory(policy))
    }

    // --- Accessors ---

    pub fn engine(&self) -> &AccessEngine {
        &self.inner.engine
    }

    pub fn metrics(&self) -> &metrics::Metrics {
        self.inner.engine.metrics()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    // --- Maintenance ---

    /// Clean up expired rate windows. Returns count removed.
    pub fn cleanup_rate_limits(&self) -> usize {
        self.inner.engine.cleanup()
    }
}

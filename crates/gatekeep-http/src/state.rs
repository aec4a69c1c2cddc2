//! HTTP application state: wraps `ServiceState` with HTTP-specific fields.
//!
//! `AppState` provides transparent access to all `ServiceState` methods
//! via `Deref`, and adds transport-specific config: CORS origins and whether
//! `X-Forwarded-For` is trusted for client addresses.

use std::ops::Deref;
use std::sync::Arc;

use axum::http::HeaderValue;
use gatekeep_service::ServiceState;
use gatekeep_service::engine::AccessPolicy;

/// A configured CORS origin that is not a valid header value.
#[derive(Debug, thiserror::Error)]
#[error("invalid CORS origin: {0}")]
pub struct InvalidOrigin(pub String);

/// Parsed CORS policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorsOrigins {
    /// No CORS headers (cross-origin requests denied by the browser).
    None,
    /// Wildcard, any origin allowed.
    Any,
    List(Vec<HeaderValue>),
}

impl CorsOrigins {
    /// Blank entries are ignored, so `--cors-origins ""` disables CORS.
    pub fn parse(origins: &[String]) -> Result<Self, InvalidOrigin> {
        let origins: Vec<&str> = origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .collect();

        match origins.as_slice() {
            [] => Ok(Self::None),
            ["*"] => Ok(Self::Any),
            _ => origins
                .iter()
                .map(|o| o.parse().map_err(|_| InvalidOrigin((*o).to_string())))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
        }
    }
}

/// Shared HTTP application state, cloneable across handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppInner>,
}

struct AppInner {
    service: ServiceState,
    cors_origins: CorsOrigins,
    trust_forwarded_for: bool,
}

impl Deref for AppState {
    type Target = ServiceState;

    fn deref(&self) -> &ServiceState {
        &self.inner.service
    }
}

impl AppState {
    /// Creates a new HTTP application state.
    pub fn new(
        service: ServiceState,
        cors_origins: &[String],
        trust_forwarded_for: bool,
    ) -> Result<Self, InvalidOrigin> {
        Ok(Self {
            inner: Arc::new(AppInner {
                service,
                cors_origins: CorsOrigins::parse(cors_origins)?,
                trust_forwarded_for,
            }),
        })
    }

    /// Wraps a service state with no CORS and peer-address resolution.
    pub fn from_service(service: ServiceState) -> Self {
        Self {
            inner: Arc::new(AppInner {
                service,
                cors_origins: CorsOrigins::None,
                trust_forwarded_for: false,
            }),
        }
    }

    /// Creates an in-memory application state (for tests and ephemeral use).
    pub fn new_in_memory() -> Self {
        Self::from_service(ServiceState::new_in_memory())
    }

    /// Creates an in-memory state with custom thresholds (for tests).
    pub fn new_in_memory_with_policy(policy: AccessPolicy) -> Self {
        Self::from_service(ServiceState::new_in_memory_with_policy(policy))
    }

    /// Returns the configured CORS policy.
    pub fn cors_origins(&self) -> &CorsOrigins {
        &self.inner.cors_origins
    }

    /// Whether the first `X-Forwarded-For` entry identifies the client.
    pub fn trust_forwarded_for(&self) -> bool {
        self.inner.trust_forwarded_for
    }

    /// Returns a reference to the underlying service state.
    pub fn service(&self) -> &ServiceState {
        &self.inner.service
    }
}

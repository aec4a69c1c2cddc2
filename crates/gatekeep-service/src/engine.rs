//! Access decision engine.
//!
//! Combines the ban set, the rate window counter and the login attempt
//! tracker into one verdict per request and one outcome per login. Every
//! request is evaluated in a fixed order:
//!
//! 1. banned IP → [`Verdict::Blocked`]
//! 2. request overflows its window → ban, [`Verdict::RateLimited`]
//! 3. otherwise → [`Verdict::Allow`]
//!
//! A ban is terminal: nothing in this module removes an IP from the set.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::auth::{CredentialVerifier, StaticCredentials};
use crate::ban::{BanSet, BanStore, normalize_ip};
use crate::error::ServiceError;
use crate::login_attempts::LoginAttemptTracker;
use crate::metrics::Metrics;
use crate::rate_limit::RateWindowCounter;

/// Thresholds for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct AccessPolicy {
    /// Rate window length in milliseconds.
    pub window_ms: u64,
    /// Requests allowed per IP within one window.
    pub max_requests: u64,
    /// Consecutive failed logins that ban an IP.
    pub max_login_attempts: u32,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            max_requests: 10,
            max_login_attempts: 5,
        }
    }
}

impl AccessPolicy {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Rejects thresholds the engine cannot enforce.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.window_ms == 0 {
            return Err(ServiceError::InvalidConfig(
                "windowMs must be greater than 0".to_string(),
            ));
        }
        if self.max_requests == 0 {
            return Err(ServiceError::InvalidConfig(
                "maxRequests must be greater than 0".to_string(),
            ));
        }
        if self.max_login_attempts == 0 {
            return Err(ServiceError::InvalidConfig(
                "maxLoginAttempts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-request access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow = 0,
    RateLimited = 1,
    Blocked = 2,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::RateLimited => "rate_limited",
            Self::Blocked => "blocked",
        }
    }
}

/// Result of a login on an allowed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Succeeded,
    /// Credentials rejected; `attempts_left` is in `1..max_login_attempts`.
    Failed { attempts_left: u32 },
    /// Credentials rejected and the threshold was reached; the IP is banned.
    Banned,
}

impl LoginOutcome {
    /// Remaining attempts to report to the client, if any.
    pub fn attempts_left(self) -> Option<u32> {
        match self {
            Self::Succeeded => None,
            Self::Failed { attempts_left } => Some(attempts_left),
            Self::Banned => Some(0),
        }
    }
}

/// Why an IP entered the ban set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanReason {
    RateLimit = 0,
    LoginAttempts = 1,
    Preloaded = 2,
}

impl BanReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::RateLimit => "rate_limit",
            Self::LoginAttempts => "login_attempts",
            Self::Preloaded => "preloaded",
        }
    }
}

/// The access decision engine.
///
/// Holds no global state of its own: the ban store and credential check are
/// injected, and the counters are per-IP concurrent maps. Unrelated IPs only
/// share a lock when they hash to the same shard.
pub struct AccessEngine {
    policy: AccessPolicy,
    bans: Arc<dyn BanStore>,
    credentials: Arc<dyn CredentialVerifier>,
    windows: RateWindowCounter,
    attempts: LoginAttemptTracker,
    metrics: Metrics,
    fail_open: bool,
}

impl AccessEngine {
    pub fn new(
        policy: AccessPolicy,
        bans: Arc<dyn BanStore>,
        credentials: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            windows: RateWindowCounter::new(policy.max_requests, policy.window()),
            attempts: LoginAttemptTracker::new(policy.max_login_attempts),
            policy,
            bans,
            credentials,
            metrics: Metrics::new(),
            fail_open: false,
        }
    }

    /// Engine with an in-memory ban set and the default stub account.
    pub fn in_memory(policy: AccessPolicy) -> Self {
        Self::new(
            policy,
            Arc::new(BanSet::new()),
            Arc::new(StaticCredentials::default()),
        )
    }

    /// Allow requests through when the ban store cannot be read.
    ///
    /// Off by default: an unreadable ban status is treated as banned.
    #[must_use]
    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    pub fn fail_open(&self) -> bool {
        self.fail_open
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn rate_windows(&self) -> &RateWindowCounter {
        &self.windows
    }

    pub fn login_attempts(&self) -> &LoginAttemptTracker {
        &self.attempts
    }

    /// Decide whether a request from `ip` may proceed, counting it now.
    pub fn check_request(&self, ip: IpAddr) -> Verdict {
        self.check_request_at(ip, Instant::now())
    }

    /// Decide whether a request from `ip` arriving at `now` may proceed.
    pub fn check_request_at(&self, ip: IpAddr, now: Instant) -> Verdict {
        let ip = normalize_ip(ip);
        let verdict = self.evaluate(ip, now);
        self.metrics.record_verdict(verdict);
        verdict
    }

    fn evaluate(&self, ip: IpAddr, now: Instant) -> Verdict {
        match self.bans.contains(ip) {
            Ok(true) => return Verdict::Blocked,
            Ok(false) => {}
            Err(e) => {
                self.metrics.record_store_error();
                if self.fail_open {
                    tracing::error!(%ip, error = %e, "ban lookup failed, allowing request");
                } else {
                    tracing::error!(%ip, error = %e, "ban lookup failed, blocking request");
                    return Verdict::Blocked;
                }
            }
        }

        let check = self.windows.record_and_check(ip, now);
        if check.within_limit {
            return Verdict::Allow;
        }

        if check.violation {
            tracing::debug!(%ip, count = check.count, "rate window exceeded");
        }
        // Also retried on later overflows in case the first insert failed.
        self.ban(ip, BanReason::RateLimit);
        Verdict::RateLimited
    }

    /// Verify credentials for a request that was already allowed, and update
    /// the attempt history for `ip`.
    pub fn login(&self, ip: IpAddr, username: &str, password: &str) -> LoginOutcome {
        let authenticated = self.credentials.verify(username, password);
        self.record_login(ip, authenticated)
    }

    /// Apply the result of an external credential check to `ip`.
    pub fn record_login(&self, ip: IpAddr, authenticated: bool) -> LoginOutcome {
        let ip = normalize_ip(ip);

        let outcome = if authenticated {
            self.attempts.record_success(ip);
            LoginOutcome::Succeeded
        } else {
            let failure = self.attempts.record_failure(ip);
            if failure.banned {
                self.ban(ip, BanReason::LoginAttempts);
                LoginOutcome::Banned
            } else {
                tracing::info!(%ip, attempts_left = failure.attempts_left, "login failed");
                LoginOutcome::Failed {
                    attempts_left: failure.attempts_left,
                }
            }
        };

        self.metrics.record_login(outcome);
        outcome
    }

    /// Ban `ip`. Returns `true` if this call added it; duplicates and store
    /// failures return `false`.
    pub fn ban(&self, ip: IpAddr, reason: BanReason) -> bool {
        let ip = normalize_ip(ip);
        match self.bans.insert(ip) {
            Ok(true) => {
                self.metrics.record_ban(reason);
                tracing::warn!(%ip, reason = reason.label(), "IP banned");
                true
            }
            Ok(false) => false,
            Err(e) => {
                self.metrics.record_store_error();
                tracing::error!(%ip, reason = reason.label(), error = %e, "failed to persist ban");
                false
            }
        }
    }

    /// Seed the ban set at startup. Returns how many IPs were newly banned.
    pub fn preload_bans(&self, ips: &[IpAddr]) -> usize {
        ips.iter()
            .filter(|ip| self.ban(**ip, BanReason::Preloaded))
            .count()
    }

    pub fn is_banned(&self, ip: IpAddr) -> Result<bool, ServiceError> {
        self.bans.contains(normalize_ip(ip))
    }

    /// Drop expired rate windows. Returns the count removed.
    pub fn cleanup(&self) -> usize {
        self.windows.cleanup(Instant::now())
    }
}

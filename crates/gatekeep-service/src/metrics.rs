//! Lightweight Prometheus-compatible metrics using atomic counters.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::{BanReason, LoginOutcome, Verdict};

const VERDICTS: [Verdict; 3] = [Verdict::Allow, Verdict::RateLimited, Verdict::Blocked];

const BAN_REASONS: [BanReason; 3] = [
    BanReason::RateLimit,
    BanReason::LoginAttempts,
    BanReason::Preloaded,
];

const LOGIN_LABELS: [&str; 3] = ["succeeded", "failed", "banned"];

/// Engine-wide counters.
pub struct Metrics {
    verdicts: [AtomicU64; 3],
    logins: [AtomicU64; 3],
    bans: [AtomicU64; 3],
    banned_ips: AtomicU64,
    store_errors: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            verdicts: [const { AtomicU64::new(0) }; 3],
            logins: [const { AtomicU64::new(0) }; 3],
            bans: [const { AtomicU64::new(0) }; 3],
            banned_ips: AtomicU64::new(0),
            store_errors: AtomicU64::new(0),
        }
    }

    pub fn record_verdict(&self, verdict: Verdict) {
        self.verdicts[verdict as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login(&self, outcome: LoginOutcome) {
        let idx = match outcome {
            LoginOutcome::Succeeded => 0,
            LoginOutcome::Failed { .. } => 1,
            LoginOutcome::Banned => 2,
        };
        self.logins[idx].fetch_add(1, Ordering::Relaxed);
    }

    /// Record a newly inserted ban. Duplicate inserts are not counted.
    pub fn record_ban(&self, reason: BanReason) {
        self.bans[reason as usize].fetch_add(1, Ordering::Relaxed);
        self.banned_ips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn verdicts(&self, verdict: Verdict) -> u64 {
        self.verdicts[verdict as usize].load(Ordering::Relaxed)
    }

    pub fn bans(&self, reason: BanReason) -> u64 {
        self.bans[reason as usize].load(Ordering::Relaxed)
    }

    /// Distinct IPs banned by this process.
    pub fn banned_ips(&self) -> u64 {
        self.banned_ips.load(Ordering::Relaxed)
    }

    pub fn store_errors(&self) -> u64 {
        self.store_errors.load(Ordering::Relaxed)
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn render(&self, tracked_windows: usize, uptime_seconds: u64) -> String {
        let mut out = String::with_capacity(1024);

        gauge(
            &mut out,
            "gatekeep_banned_ips",
            "IPs currently banned",
            self.banned_ips(),
        );
        gauge(
            &mut out,
            "gatekeep_tracked_windows",
            "IPs with a live rate window",
            tracked_windows,
        );
        gauge(
            &mut out,
            "gatekeep_uptime_seconds",
            "Server uptime in seconds",
            uptime_seconds,
        );

        header(
            &mut out,
            "gatekeep_requests_total",
            "Access decisions by verdict.",
        );
        for verdict in VERDICTS {
            let label = verdict.label();
            let total = self.verdicts(verdict);
            let _ = writeln!(out, "gatekeep_requests_total{{verdict=\"{label}\"}} {total}");
        }

        header(
            &mut out,
            "gatekeep_logins_total",
            "Login attempts by outcome.",
        );
        for (idx, label) in LOGIN_LABELS.iter().enumerate() {
            let total = self.logins[idx].load(Ordering::Relaxed);
            let _ = writeln!(out, "gatekeep_logins_total{{outcome=\"{label}\"}} {total}");
        }

        header(&mut out, "gatekeep_bans_total", "IPs banned by reason.");
        for reason in BAN_REASONS {
            let label = reason.label();
            let total = self.bans(reason);
            let _ = writeln!(out, "gatekeep_bans_total{{reason=\"{label}\"}} {total}");
        }

        header(
            &mut out,
            "gatekeep_store_errors_total",
            "Ban store lookups or inserts that failed.",
        );
        let _ = writeln!(out, "gatekeep_store_errors_total {}", self.store_errors());

        out
    }
}

fn header(out: &mut String, name: &str, help: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
}

fn gauge(out: &mut String, name: &str, help: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} gauge");
    let _ = writeln!(out, "{name} {value}");
}

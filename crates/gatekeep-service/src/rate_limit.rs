//! Per-IP fixed-window request counter.
//!
//! Transport-agnostic core. The access engine calls `record_and_check()` once
//! per request; the transport only supplies the client address.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Result of counting one request against its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCheck {
    /// `count <= limit` after this request was counted.
    pub within_limit: bool,
    /// Set only on the request that pushed the count past the limit.
    pub violation: bool,
    /// Requests counted in the current window, including this one.
    pub count: u64,
}

struct Window {
    start: Instant,
    count: u64,
}

/// In-memory per-IP rate counter with fixed windows.
pub struct RateWindowCounter {
    max_requests: u64,
    window: Duration,
    counters: DashMap<IpAddr, Window>,
}

impl RateWindowCounter {
    /// Creates a counter allowing `max_requests` per `window` for each IP.
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            counters: DashMap::new(),
        }
    }

    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Counts one request from `ip` at `now` and reports whether it fits the
    /// window. The shard lock is held across the read-modify-write, so two
    /// concurrent requests from one IP never observe the same count.
    pub fn record_and_check(&self, ip: IpAddr, now: Instant) -> RateCheck {
        let mut entry = self
            .counters
            .entry(ip)
            .or_insert(Window { start: now, count: 0 });
        let w = entry.value_mut();

        if w.count == 0 || now.saturating_duration_since(w.start) >= self.window {
            w.start = now;
            w.count = 1;
        } else {
            w.count = w.count.saturating_add(1);
        }

        RateCheck {
            within_limit: w.count <= self.max_requests,
            violation: w.count == self.max_requests.saturating_add(1),
            count: w.count,
        }
    }

    /// Removes windows that have expired at `now`. Returns the count removed.
    pub fn cleanup(&self, now: Instant) -> usize {
        let before = self.counters.len();
        let window = self.window;
        self.counters
            .retain(|_, w| now.saturating_duration_since(w.start) < window);
        before - self.counters.len()
    }

    /// Number of IPs with a live window record.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(60);

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(203, 0, 113, last))
    }

    #[test]
    fn limit_requests_allowed_then_single_violation() {
        let counter = RateWindowCounter::new(10, WINDOW);
        let now = Instant::now();

        for n in 1..=10 {
            let check = counter.record_and_check(ip(1), now);
            assert!(check.within_limit, "request {n} should be allowed");
            assert!(!check.violation);
            assert_eq!(check.count, n);
        }

        let eleventh = counter.record_and_check(ip(1), now);
        assert!(!eleventh.within_limit);
        assert!(eleventh.violation);

        let twelfth = counter.record_and_check(ip(1), now);
        assert!(!twelfth.within_limit);
        assert!(!twelfth.violation, "violation is reported once per window");
    }

    #[test]
    fn window_resets_once_duration_elapsed() {
        let counter = RateWindowCounter::new(2, WINDOW);
        let start = Instant::now();

        counter.record_and_check(ip(2), start);
        counter.record_and_check(ip(2), start);
        assert!(!counter.record_and_check(ip(2), start).within_limit);

        // One tick before the boundary is still the old window.
        let almost = start + WINDOW - Duration::from_millis(1);
        assert!(!counter.record_and_check(ip(2), almost).within_limit);

        let boundary = start + WINDOW;
        let fresh = counter.record_and_check(ip(2), boundary);
        assert!(fresh.within_limit);
        assert_eq!(fresh.count, 1);
        assert!(counter.record_and_check(ip(2), boundary).within_limit);
        assert!(counter.record_and_check(ip(2), boundary).violation);
    }

    #[test]
    fn ips_are_counted_independently() {
        let counter = RateWindowCounter::new(1, WINDOW);
        let now = Instant::now();

        assert!(counter.record_and_check(ip(3), now).within_limit);
        assert!(counter.record_and_check(ip(4), now).within_limit);
        assert!(counter.record_and_check(ip(3), now).violation);
        assert_eq!(counter.len(), 2);
    }

    #[test]
    fn cleanup_drops_only_expired_windows() {
        let counter = RateWindowCounter::new(10, WINDOW);
        let start = Instant::now();

        counter.record_and_check(ip(5), start);
        counter.record_and_check(ip(6), start + Duration::from_secs(30));

        let removed = counter.cleanup(start + WINDOW);
        assert_eq!(removed, 1);
        assert_eq!(counter.len(), 1);
    }

    #[test]
    fn concurrent_overflow_reports_exactly_one_violation() {
        let counter = Arc::new(RateWindowCounter::new(10, WINDOW));
        let now = Instant::now();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || counter.record_and_check(ip(7), now))
            })
            .collect();
        let checks: Vec<RateCheck> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(checks.iter().filter(|c| c.within_limit).count(), 10);
        assert_eq!(checks.iter().filter(|c| c.violation).count(), 1);
    }
}

//! Per-IP failed-login counter.
//!
//! A record exists only between the first failure and either a successful
//! login or the failure that reaches the threshold. Both paths delete it.

use std::net::IpAddr;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Outcome of recording one failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    /// This failure reached the threshold; the caller must ban the IP.
    pub banned: bool,
    /// `max_attempts - attempts` after this failure; 0 when `banned`.
    pub attempts_left: u32,
}

/// Thread-safe failed-login tracker keyed by client IP.
pub struct LoginAttemptTracker {
    max_attempts: u32,
    attempts: DashMap<IpAddr, u32>,
}

impl LoginAttemptTracker {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempts: DashMap::new(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Counts a failed login from `ip`.
    ///
    /// The increment, the threshold test and the removal happen under one
    /// entry guard, so concurrent failures from the same IP produce exactly
    /// one `banned` outcome.
    pub fn record_failure(&self, ip: IpAddr) -> FailureOutcome {
        let attempts = match self.attempts.entry(ip) {
            Entry::Occupied(mut e) => {
                let attempts = e.get().saturating_add(1);
                if attempts >= self.max_attempts {
                    e.remove();
                } else {
                    *e.get_mut() = attempts;
                }
                attempts
            }
            Entry::Vacant(e) => {
                if self.max_attempts > 1 {
                    e.insert(1);
                }
                1
            }
        };

        if attempts >= self.max_attempts {
            FailureOutcome {
                banned: true,
                attempts_left: 0,
            }
        } else {
            FailureOutcome {
                banned: false,
                attempts_left: self.max_attempts - attempts,
            }
        }
    }

    /// Clears any failure history for `ip`.
    pub fn record_success(&self, ip: IpAddr) {
        self.attempts.remove(&ip);
    }

    /// Failures currently on record for `ip`.
    pub fn attempts(&self, ip: IpAddr) -> Option<u32> {
        self.attempts.get(&ip).map(|a| *a)
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::{Arc, Barrier};

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(198, 51, 100, last))
    }

    #[test]
    fn countdown_then_ban_on_fifth_failure() {
        let tracker = LoginAttemptTracker::new(5);

        let left: Vec<u32> = (0..4)
            .map(|_| {
                let outcome = tracker.record_failure(ip(1));
                assert!(!outcome.banned);
                outcome.attempts_left
            })
            .collect();
        assert_eq!(left, vec![4, 3, 2, 1]);
        assert_eq!(tracker.attempts(ip(1)), Some(4));

        let fifth = tracker.record_failure(ip(1));
        assert_eq!(
            fifth,
            FailureOutcome {
                banned: true,
                attempts_left: 0
            }
        );
        assert_eq!(tracker.attempts(ip(1)), None);
    }

    #[test]
    fn success_resets_history() {
        let tracker = LoginAttemptTracker::new(5);
        for _ in 0..3 {
            tracker.record_failure(ip(2));
        }
        tracker.record_success(ip(2));
        assert!(tracker.is_empty());

        let outcome = tracker.record_failure(ip(2));
        assert!(!outcome.banned);
        assert_eq!(outcome.attempts_left, 4);
    }

    #[test]
    fn success_without_history_is_noop() {
        let tracker = LoginAttemptTracker::new(5);
        tracker.record_success(ip(3));
        assert!(tracker.is_empty());
    }

    #[test]
    fn threshold_of_one_bans_immediately() {
        let tracker = LoginAttemptTracker::new(1);
        let outcome = tracker.record_failure(ip(4));
        assert!(outcome.banned);
        assert_eq!(outcome.attempts_left, 0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn concurrent_failures_ban_exactly_once() {
        const N: usize = 5;
        let tracker = Arc::new(LoginAttemptTracker::new(N as u32));
        let barrier = Arc::new(Barrier::new(N));

        let handles: Vec<_> = (0..N)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    tracker.record_failure(ip(5))
                })
            })
            .collect();
        let outcomes: Vec<FailureOutcome> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(outcomes.iter().filter(|o| o.banned).count(), 1);
        let mut left: Vec<u32> = outcomes.iter().map(|o| o.attempts_left).collect();
        left.sort_unstable();
        assert_eq!(left, vec![0, 1, 2, 3, 4]);
        assert_eq!(tracker.attempts(ip(5)), None);
    }
}

//! Interval Policy
//!
//! Decides when the next automatic fetch is due.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Fetch timing policy.
#[cfg_attr(test, mockall::automock)]
pub trait IntervalPolicy: Send + Sync {
    /// Whether an automatic fetch is due at `now`.
    fn is_due(&self, now: Instant) -> bool;

    /// Whether any attempt is currently running.
    fn in_flight(&self) -> bool;

    /// An attempt started.
    fn started(&self, now: Instant);

    /// One running attempt published its result.
    fn completed(&self, now: Instant);

    /// One running attempt failed.
    fn failed(&self, now: Instant);
}

#[derive(Debug, Default)]
struct Attempts {
    last_started: Option<Instant>,
    last_finished: Option<Instant>,
    in_flight: usize,
}

/// Fixed refresh interval measured from the start of the last attempt.
///
/// Failed attempts count as attempts: the next automatic fetch waits a full
/// interval.
#[derive(Debug)]
pub struct FixedIntervalPolicy {
    interval: Duration,
    attempts: Mutex<Attempts>,
}

impl FixedIntervalPolicy {
    /// Create new policy.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            attempts: Mutex::new(Attempts::default()),
        }
    }

    /// Refresh interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the last attempt finished, successfully or not.
    pub fn last_finished(&self) -> Option<Instant> {
        self.attempts.lock().unwrap().last_finished
    }

    fn finish(&self, now: Instant) {
        let mut attempts = self.attempts.lock().unwrap();
        attempts.in_flight = attempts.in_flight.saturating_sub(1);
        attempts.last_finished = Some(now);
    }
}

impl IntervalPolicy for FixedIntervalPolicy {
    fn is_due(&self, now: Instant) -> bool {
        let attempts = self.attempts.lock().unwrap();
        if attempts.in_flight > 0 {
            return false;
        }
        match attempts.last_started {
            Some(started) => now.saturating_duration_since(started) >= self.interval,
            None => true,
        }
    }

    fn in_flight(&self) -> bool {
        self.attempts.lock().unwrap().in_flight > 0
    }

    fn started(&self, now: Instant) {
        let mut attempts = self.attempts.lock().unwrap();
        attempts.in_flight += 1;
        attempts.last_started = Some(now);
    }

    fn completed(&self, now: Instant) {
        self.finish(now);
    }

    fn failed(&self, now: Instant) {
        self.finish(now);
    }
}

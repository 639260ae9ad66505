//! Fetch Scheduler
//!
//! Gates fetches and runs the periodic trigger task that starts automatic
//! fetches while the session is authenticated.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::scheduler::{FixedIntervalPolicy, IntervalPolicy};

struct TriggerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Fetch gating and periodic trigger.
pub struct FetchScheduler<P: IntervalPolicy = FixedIntervalPolicy> {
    policy: Arc<P>,
    check_interval: Duration,
    task: Mutex<Option<TriggerTask>>,
}

impl FetchScheduler<FixedIntervalPolicy> {
    /// Scheduler with a fixed refresh interval, checked every `check_interval`.
    pub fn with_intervals(refresh_interval: Duration, check_interval: Duration) -> Self {
        Self::new(FixedIntervalPolicy::new(refresh_interval), check_interval)
    }
}

impl<P: IntervalPolicy + 'static> FetchScheduler<P> {
    /// Create new scheduler.
    pub fn new(policy: P, check_interval: Duration) -> Self {
        Self {
            policy: Arc::new(policy),
            check_interval,
            task: Mutex::new(None),
        }
    }

    /// The interval policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Whether a fetch should run now.
    ///
    /// Forced fetches always run. Otherwise a fetch is skipped while another
    /// is in flight, and runs when nothing is cached or the policy is due.
    pub fn should_fetch(&self, force: bool, cache_empty: bool) -> bool {
        if force {
            return true;
        }
        if self.policy.in_flight() {
            return false;
        }
        cache_empty || self.policy.is_due(Instant::now())
    }

    /// Record the start of an attempt.
    ///
    /// The attempt ends when [`FetchAttempt::completed`] or
    /// [`FetchAttempt::failed`] is called. Dropping it unfinished, as happens
    /// when the fetching future is cancelled, counts as a failure.
    pub fn begin(&self) -> FetchAttempt<'_, P> {
        self.policy.started(Instant::now());
        FetchAttempt {
            policy: self.policy.as_ref(),
            finished: false,
        }
    }

    /// Arm or disarm the periodic trigger.
    ///
    /// While armed, `trigger` runs on each check tick at which the policy is
    /// due. Arming an armed scheduler keeps the running task. Arming outside a
    /// tokio runtime logs a warning and leaves the scheduler off.
    pub fn set_on<F>(&self, on: bool, trigger: F)
    where
        F: Fn() + Send + 'static,
    {
        let mut task = self.task.lock().unwrap();

        if !on {
            if let Some(running) = task.take() {
                running.cancel.cancel();
                debug!("Fetch trigger disarmed");
            }
            return;
        }

        if task.as_ref().map_or(false, |t| !t.handle.is_finished()) {
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No tokio runtime; automatic fetching stays off");
                return;
            }
        };

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let policy = self.policy.clone();
        let period = self.check_interval;

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if policy.is_due(Instant::now()) {
                            debug!("Automatic fetch due");
                            trigger();
                        }
                    }
                }
            }
        });

        debug!(check_interval = ?period, "Fetch trigger armed");
        *task = Some(TriggerTask { cancel, handle });
    }

    /// Whether the trigger task is armed.
    pub fn is_on(&self) -> bool {
        self.task
            .lock()
            .unwrap()
            .as_ref()
            .map_or(false, |t| !t.handle.is_finished())
    }
}

/// A running fetch attempt.
#[must_use = "dropping the attempt records it as failed"]
pub struct FetchAttempt<'a, P: IntervalPolicy> {
    policy: &'a P,
    finished: bool,
}

impl<P: IntervalPolicy> FetchAttempt<'_, P> {
    /// The attempt published its result.
    pub fn completed(mut self) {
        self.finished = true;
        self.policy.completed(Instant::now());
    }

    /// The attempt failed.
    pub fn failed(mut self) {
        self.finished = true;
        self.policy.failed(Instant::now());
    }
}

impl<P: IntervalPolicy> Drop for FetchAttempt<'_, P> {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Fetch attempt abandoned");
            self.policy.failed(Instant::now());
        }
    }
}

impl<P: IntervalPolicy> Drop for FetchScheduler<P> {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(running) = task.take() {
                running.cancel.cancel();
            }
        }
    }
}

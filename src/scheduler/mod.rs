//! Scheduling
//!
//! Fetch gating and the automatic refresh trigger.

pub mod fetch_scheduler;
pub mod policy;

pub use fetch_scheduler::{FetchAttempt, FetchScheduler};
pub use policy::{FixedIntervalPolicy, IntervalPolicy};

#[cfg(test)]
pub use policy::MockIntervalPolicy;

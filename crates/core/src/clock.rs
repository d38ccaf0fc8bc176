// crates/core/src/clock.rs
//! Injectable wall-clock source.
//!
//! Every elapsed-time computation in the engine takes its `now` from a
//! `Clock` held in app state, so lifecycle and suggestion behavior is
//! deterministic under test.

use chrono::{DateTime, Utc};

/// Wall-clock source for elapsed-time computations.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current time as epoch seconds (the storage representation).
    fn now_ts(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

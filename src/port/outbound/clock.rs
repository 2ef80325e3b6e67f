//! Time source port.

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Every time-dependent rule (close times, cooldowns, cancellation windows)
/// reads the clock once per operation through this trait.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases.

pub mod betting;
pub mod risk;
pub mod settlement;
pub mod wallet;

use chrono::Duration;

/// Whole seconds as a [`Duration`], saturating at the largest representable span.
pub(crate) fn seconds(secs: u64) -> Duration {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1_000);
    Duration::seconds(secs)
}

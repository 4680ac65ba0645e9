//! Rolling retention window over stored snapshots.

use chrono::{DateTime, Duration, Utc};

use crate::filter::Filter;
use crate::snapshot::STORED_AT_FIELD;

/// Snapshots whose `created_at` is strictly earlier than `now - window` are
/// eligible for deletion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    window: Duration,
}

impl RetentionPolicy {
    pub const DEFAULT_DAYS: i64 = 7;

    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn days(days: i64) -> Self {
        Self::new(Duration::days(days))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// The oldest `created_at` that survives a sweep run at `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    pub fn is_expired(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        stored_at < self.cutoff(now)
    }

    /// Store filter selecting every expired snapshot at `now`.
    pub fn sweep_filter(&self, now: DateTime<Utc>) -> Filter {
        Filter::before(STORED_AT_FIELD, self.cutoff(now))
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::days(Self::DEFAULT_DAYS)
    }
}

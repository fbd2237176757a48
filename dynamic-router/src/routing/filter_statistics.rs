//! Per-filter match counters updated concurrently by routing.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NEVER: u64 = 0;

/// Match counters owned by one subscription.
///
/// Timestamps are stored as epoch milliseconds; `0` means "never matched".
#[derive(Debug, Default)]
pub struct PrioritizedFilterStatistics {
    count: AtomicU64,
    first_match_millis: AtomicU64,
    last_match_millis: AtomicU64,
}

impl PrioritizedFilterStatistics {
    /// Records one message forwarded through the owning filter.
    pub(crate) fn record_match(&self) {
        let now = epoch_millis(SystemTime::now()).max(1);
        self.count.fetch_add(1, Ordering::Relaxed);
        let _ = self.first_match_millis.compare_exchange(
            NEVER,
            now,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
        self.last_match_millis.fetch_max(now, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn first_matched_at(&self) -> Option<SystemTime> {
        from_epoch_millis(self.first_match_millis.load(Ordering::Relaxed))
    }

    pub fn last_matched_at(&self) -> Option<SystemTime> {
        from_epoch_millis(self.last_match_millis.load(Ordering::Relaxed))
    }

    pub(crate) fn snapshot(&self, filter_id: &str) -> FilterStatisticsSnapshot {
        let first = self.first_match_millis.load(Ordering::Relaxed);
        let last = self.last_match_millis.load(Ordering::Relaxed);
        FilterStatisticsSnapshot {
            filter_id: filter_id.to_string(),
            count: self.count(),
            first_match_epoch_millis: (first != NEVER).then_some(first),
            last_match_epoch_millis: (last != NEVER).then_some(last),
        }
    }
}

/// Point-in-time copy of a filter's counters, ready for serialization.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStatisticsSnapshot {
    pub filter_id: String,
    pub count: u64,
    pub first_match_epoch_millis: Option<u64>,
    pub last_match_epoch_millis: Option<u64>,
}

fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(NEVER)
}

fn from_epoch_millis(millis: u64) -> Option<SystemTime> {
    (millis != NEVER).then(|| UNIX_EPOCH + Duration::from_millis(millis))
}

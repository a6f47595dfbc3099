//! Aggregation windows.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// A half-open time window `[start, end)` that a report aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl Period {
    /// The full local day `date` at the given site offset.
    pub fn day(date: NaiveDate, offset: FixedOffset) -> Self {
        let local_midnight = date.and_time(NaiveTime::MIN);
        // Local wall time minus the offset is the UTC instant; plain
        // arithmetic keeps this total (fixed offsets have no gaps).
        let start = Utc.from_utc_datetime(
            &(local_midnight - Duration::seconds(offset.local_minus_utc() as i64)),
        );
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    /// True when `timestamp` falls inside the window.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    /// The local calendar date the window covers.
    pub fn local_date(&self, offset: FixedOffset) -> NaiveDate {
        self.start.with_timezone(&offset).date_naive()
    }
}

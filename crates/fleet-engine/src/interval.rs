//! Half-open time intervals.
//!
//! Every overlap test in the crate goes through [`overlaps`]. Intervals are
//! `[start, end)`: touching intervals do not overlap and a zero-length interval
//! overlaps nothing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Two half-open intervals overlap iff `a_start < b_end && b_start < a_end`.
///
/// Empty intervals (`start >= end`) never overlap anything.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    if a_start >= a_end || b_start >= b_end {
        return false;
    }
    a_start < b_end && b_start < a_end
}

/// Minutes shared by two half-open intervals, or 0 when they do not overlap.
pub fn overlap_minutes(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> i64 {
    if !overlaps(a_start, a_end, b_start, b_end) {
        return 0;
    }
    (a_end.min(b_end) - a_start.max(b_start)).num_minutes()
}

/// A half-open `[start, end)` time span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    /// True when `self` lies entirely inside the closed range `[from, to]`.
    pub fn lies_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start >= from && self.end <= to
    }
}

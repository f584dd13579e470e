//! Ordered half-open time intervals with merge and subtraction.
//!
//! Everything downstream (availability, busy feeds) is built on these two
//! operations. Both are pure and total: malformed intervals (`end <= start`)
//! are dropped silently rather than reported — that is documented policy,
//! not a failure mode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A half-open time range `[start, end)`. Valid only when `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Construct a validated interval; `None` when `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

/// Returns a sorted, non-overlapping cover of `intervals`.
///
/// Intervals that touch (`a.end == b.start`) or overlap are merged into one;
/// zero/negative-length inputs are discarded.
pub fn normalize(mut intervals: Vec<TimeInterval>) -> Vec<TimeInterval> {
    intervals.retain(TimeInterval::is_valid);
    intervals.sort_by_key(|iv| iv.start);

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        match merged.last_mut() {
            // Sorted by start, so overlap/touch reduces to a single check.
            Some(last) if iv.start <= last.end => {
                if iv.end > last.end {
                    last.end = iv.end;
                }
            }
            _ => merged.push(iv),
        }
    }
    merged
}

/// Returns the ordered maximal free sub-intervals of `universe` after
/// removing every interval in `busy`.
///
/// `busy` must already be normalized (sorted, non-overlapping). Single
/// left-to-right sweep: emit the gap before each busy interval, advance a
/// cursor past it, and emit the trailing gap. O(n) in the busy count.
pub fn subtract(universe: TimeInterval, busy: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut free = Vec::new();
    let mut cursor = universe.start;

    for iv in busy {
        if iv.end <= cursor {
            continue;
        }
        if iv.start >= universe.end {
            break;
        }
        if iv.start > cursor {
            free.push(TimeInterval {
                start: cursor,
                end: iv.start.min(universe.end),
            });
        }
        cursor = cursor.max(iv.end);
        if cursor >= universe.end {
            break;
        }
    }

    if cursor < universe.end {
        free.push(TimeInterval {
            start: cursor,
            end: universe.end,
        });
    }

    free
}

//! Availability computation — classify a bounded horizon into bookable slots.
//!
//! Subtracts merged busy calendars from the queried window and tiles the
//! remaining free runs with fixed-duration slots. Pure: identical inputs
//! yield identical output.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::busy::BusyCalendar;
use crate::interval::{self, TimeInterval};

/// Hard cap on the queried horizon.
pub const MAX_WINDOW_DAYS: i64 = 30;

/// Default horizon when the caller omits bounds.
pub const DEFAULT_WINDOW_DAYS: i64 = 14;

/// A bookable slot: fixed duration, fully inside free time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The result of a slot computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSchedule {
    pub slots: Vec<AvailabilitySlot>,
    pub slot_duration_min: u32,
}

/// Resolve the caller-supplied window bounds into an effective horizon.
///
/// Bounds are interpreted in the service's home zone, not the caller's.
/// Corrections, in order:
/// - missing `start` → beginning of the current day in `tz`
/// - missing `end` → end of the day `DEFAULT_WINDOW_DAYS` days after `start`
/// - `end <= start` → `start + 1d`
/// - span over `MAX_WINDOW_DAYS` → end clamped to `start + 30d`
pub fn resolve_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    tz: Tz,
    now: DateTime<Utc>,
) -> TimeInterval {
    let start = start.unwrap_or_else(|| start_of_day(now, tz));

    let mut end = end.unwrap_or_else(|| {
        let local_date = start.with_timezone(&tz).date_naive() + Duration::days(DEFAULT_WINDOW_DAYS);
        let end_of_day = local_date.and_hms_opt(23, 59, 59).unwrap_or_default();
        tz.from_local_datetime(&end_of_day)
            .earliest()
            .map_or_else(|| start + Duration::days(DEFAULT_WINDOW_DAYS), |dt| dt.with_timezone(&Utc))
    });

    if end <= start {
        end = start + Duration::days(1);
    }
    if end - start > Duration::days(MAX_WINDOW_DAYS) {
        end = start + Duration::days(MAX_WINDOW_DAYS);
    }

    TimeInterval { start, end }
}

/// Midnight of `now`'s calendar day in `tz`, as a UTC instant.
fn start_of_day(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let midnight = now.with_timezone(&tz).date_naive().and_time(NaiveTime::MIN);
    // A DST gap at local midnight leaves no representable instant; fall
    // back to the current instant rather than guessing.
    tz.from_local_datetime(&midnight)
        .earliest()
        .map_or(now, |dt| dt.with_timezone(&Utc))
}

/// Compute bookable slots for `window` given raw busy calendars.
///
/// Calendars may be unsorted and overlapping; they are merged into one
/// normalized busy set first. Each free run is tiled from its start with
/// consecutive slots of exactly `slot_duration_min` minutes; a remainder
/// shorter than one slot emits nothing. Slots never cross a busy boundary
/// and never extend past `window.end`.
pub fn compute_slots(
    window: TimeInterval,
    calendars: &[BusyCalendar],
    slot_duration_min: u32,
) -> SlotSchedule {
    // A zero-length slot cannot advance the tiling cursor; there is
    // nothing bookable to offer.
    if slot_duration_min == 0 {
        return SlotSchedule {
            slots: Vec::new(),
            slot_duration_min,
        };
    }

    let busy = interval::normalize(calendars.iter().flatten().copied().collect());
    let step = Duration::minutes(i64::from(slot_duration_min));

    let mut slots = Vec::new();
    for free in interval::subtract(window, &busy) {
        let mut cursor = free.start;
        while cursor + step <= free.end {
            slots.push(AvailabilitySlot {
                start: cursor,
                end: cursor + step,
            });
            cursor += step;
        }
    }

    SlotSchedule {
        slots,
        slot_duration_min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TZ: Tz = chrono_tz::Europe::Berlin;

    fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, min, 0).unwrap()
    }

    fn iv(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeInterval {
        TimeInterval { start, end }
    }

    #[test]
    fn resolve_window_defaults_to_current_day_start() {
        let now = at(2, 15, 42);
        let window = resolve_window(None, None, TZ, now);

        let local_start = window.start.with_timezone(&TZ);
        assert_eq!(local_start.time(), NaiveTime::MIN);
        assert_eq!(local_start.date_naive(), now.with_timezone(&TZ).date_naive());

        let span = window.end - window.start;
        assert!(span > Duration::days(DEFAULT_WINDOW_DAYS));
        assert!(span < Duration::days(DEFAULT_WINDOW_DAYS + 1));
    }

    #[test]
    fn resolve_window_corrects_inverted_bounds() {
        let start = at(2, 10, 0);
        let window = resolve_window(Some(start), Some(at(1, 10, 0)), TZ, start);
        assert_eq!(window.end, start + Duration::days(1));
    }

    #[test]
    fn resolve_window_clamps_oversized_span() {
        let start = at(1, 0, 0);
        let window = resolve_window(Some(start), Some(start + Duration::days(90)), TZ, start);
        assert_eq!(window.end, start + Duration::days(MAX_WINDOW_DAYS));
    }

    #[test]
    fn resolve_window_keeps_valid_bounds() {
        let start = at(2, 9, 0);
        let end = at(9, 18, 0);
        let window = resolve_window(Some(start), Some(end), TZ, start);
        assert_eq!(window, iv(start, end));
    }

    #[test]
    fn empty_busy_set_tiles_the_whole_window() {
        let window = iv(at(2, 9, 0), at(2, 11, 0));
        let schedule = compute_slots(window, &[], 30);
        assert_eq!(schedule.slots.len(), 4);
        assert_eq!(schedule.slots[0].start, window.start);
        assert_eq!(schedule.slots[3].end, window.end);
    }

    #[test]
    fn busy_covering_the_window_yields_no_slots() {
        let window = iv(at(2, 9, 0), at(2, 11, 0));
        let busy = vec![vec![iv(at(2, 8, 0), at(2, 12, 0))]];
        assert!(compute_slots(window, &busy, 30).slots.is_empty());
    }

    #[test]
    fn free_run_shorter_than_one_slot_emits_nothing() {
        let window = iv(at(2, 9, 0), at(2, 9, 20));
        assert!(compute_slots(window, &[], 30).slots.is_empty());
    }

    #[test]
    fn zero_slot_duration_yields_no_slots() {
        let window = iv(at(2, 9, 0), at(2, 11, 0));
        let schedule = compute_slots(window, &[], 0);
        assert!(schedule.slots.is_empty());
        assert_eq!(schedule.slot_duration_min, 0);
    }

    #[test]
    fn partial_trailing_slot_is_dropped() {
        // 70 minutes free → two 30-minute slots, 10-minute remainder dropped.
        let window = iv(at(2, 9, 0), at(2, 10, 10));
        let schedule = compute_slots(window, &[], 30);
        assert_eq!(schedule.slots.len(), 2);
        assert_eq!(schedule.slots[1].end, at(2, 10, 0));
    }

    #[test]
    fn slots_resume_after_busy_interval() {
        // Monday, one busy hour 10:00-11:00, 30-minute slots: tiling runs
        // 00:00-10:00, skips the busy hour, resumes at 11:00.
        let window = iv(at(2, 0, 0), at(2, 23, 59));
        let busy = vec![vec![iv(at(2, 10, 0), at(2, 11, 0))]];
        let schedule = compute_slots(window, &busy, 30);

        assert_eq!(schedule.slots[0].start, at(2, 0, 0));
        assert!(schedule.slots.contains(&AvailabilitySlot {
            start: at(2, 9, 30),
            end: at(2, 10, 0),
        }));
        assert!(schedule.slots.contains(&AvailabilitySlot {
            start: at(2, 11, 0),
            end: at(2, 11, 30),
        }));
        for slot in &schedule.slots {
            assert!(slot.end <= at(2, 10, 0) || slot.start >= at(2, 11, 0));
        }
        // 20 slots before the busy hour, 25 after (11:00-23:30).
        assert_eq!(schedule.slots.len(), 45);
    }

    #[test]
    fn slots_are_exact_length_disjoint_and_inside_free_runs() {
        let window = iv(at(2, 8, 0), at(3, 8, 0));
        let busy = vec![
            vec![iv(at(2, 10, 15), at(2, 12, 0))],
            vec![iv(at(2, 11, 0), at(2, 14, 45)), iv(at(2, 20, 0), at(2, 20, 1))],
        ];
        let schedule = compute_slots(window, &busy, 45);

        let merged = crate::interval::normalize(busy.iter().flatten().copied().collect());
        for slot in &schedule.slots {
            assert_eq!(slot.end - slot.start, Duration::minutes(45));
            assert!(slot.start >= window.start && slot.end <= window.end);
            for b in &merged {
                assert!(slot.end <= b.start || slot.start >= b.end);
            }
        }
        for pair in schedule.slots.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn compute_slots_is_deterministic() {
        let window = iv(at(2, 0, 0), at(4, 0, 0));
        let busy = vec![vec![iv(at(2, 10, 0), at(2, 11, 0)), iv(at(3, 1, 0), at(3, 9, 0))]];
        let a = compute_slots(window, &busy, 30);
        let b = compute_slots(window, &busy, 30);
        assert_eq!(a, b);
    }
}

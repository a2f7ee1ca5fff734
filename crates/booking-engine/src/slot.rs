//! Slot slicing -- fixed-duration bookable units cut from a range.
//!
//! Slicing walks forward from the range start in `duration` steps and emits
//! a slot only when the slot end still fits inside the range; a trailing
//! partial slot is discarded, never truncated.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::range::BookingRange;

/// A fixed-duration bookable unit. `rrule` is set for recurring pages
/// (weekly repetition), `None` for one-off pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: Tz,
    pub rrule: Option<String>,
}

/// Lazy iterator over the slots of a single range.
///
/// A pure function of its inputs: two iterators built from the same range
/// and duration yield identical sequences. The iterator is finite; a
/// non-positive duration yields nothing.
#[derive(Debug, Clone)]
pub struct SlotIter {
    cursor: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    timezone: Tz,
    rrule: Option<String>,
}

impl Iterator for SlotIter {
    type Item = BookingSlot;

    fn next(&mut self) -> Option<BookingSlot> {
        if self.step <= Duration::zero() {
            return None;
        }
        let slot_end = self.cursor + self.step;
        if slot_end > self.end {
            return None;
        }
        let slot = BookingSlot {
            start: self.cursor,
            end: slot_end,
            timezone: self.timezone,
            rrule: self.rrule.clone(),
        };
        self.cursor = slot_end;
        Some(slot)
    }
}

/// Slice a range into slots of `duration_minutes`, tagging each with `rrule`.
pub fn slots_in_range(
    range: &BookingRange,
    duration_minutes: u32,
    rrule: Option<&str>,
) -> SlotIter {
    SlotIter {
        cursor: range.start,
        end: range.end,
        step: Duration::minutes(duration_minutes as i64),
        timezone: range.timezone,
        rrule: rrule.map(str::to_owned),
    }
}

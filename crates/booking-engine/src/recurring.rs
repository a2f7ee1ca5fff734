//! Weekly recurrence -- normalization, weekday grouping, and RRULE expansion.
//!
//! Recurring ranges have no calendar-day anchor: two ranges in different
//! weeks conflict when they would land on the same weekday and time once the
//! pattern repeats. All comparisons therefore happen in a canonical week,
//! the week containing `now`, onto which any instant can be projected while
//! preserving its weekday and time of day.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use rrule::RRuleSet;

use crate::error::{EngineError, Result};
use crate::range::{start_of_week, BookingRange};
use crate::slot::BookingSlot;

/// Project `instant` onto the week containing `now`, preserving weekday and
/// time of day. Seconds and sub-second precision are zeroed so projected
/// instants compare cleanly.
pub fn normalize_to_week(
    instant: DateTime<Utc>,
    week_start: Weekday,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let week_anchor = start_of_week(now.date_naive(), week_start);
    let day = week_anchor + Duration::days(instant.weekday().days_since(week_start) as i64);
    let time = instant.time()
        - Duration::seconds(instant.time().second() as i64)
        - Duration::nanoseconds(instant.time().nanosecond() as i64);
    Utc.from_utc_datetime(&day.and_time(time))
}

/// One weekday bucket of the recurring display.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringDay {
    pub date: NaiveDate,
    pub ranges: Vec<BookingRange>,
}

/// Read-only grouping of ranges by weekday, starting at the configured week
/// start. Always seven buckets; not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringWeek {
    pub days: Vec<RecurringDay>,
}

/// Group `ranges` into the seven weekday buckets of the week containing `now`.
pub fn recurring_week(
    ranges: &[BookingRange],
    week_start: Weekday,
    now: DateTime<Utc>,
) -> RecurringWeek {
    let week_anchor = start_of_week(now.date_naive(), week_start);
    let days = (0..7)
        .map(|offset| {
            let date = week_anchor + Duration::days(offset);
            let ranges = ranges
                .iter()
                .filter(|r| r.start.weekday() == date.weekday())
                .cloned()
                .collect();
            RecurringDay { date, ranges }
        })
        .collect();
    RecurringWeek { days }
}

/// Return the first existing range conflicting with `[start, end)` once both
/// sides are projected onto the canonical week.
///
/// Open-interval semantics as in [`crate::range::detect_overlap`]; a range
/// whose id equals `exclude` is skipped.
pub fn detect_recurring_overlap<'a>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    existing: &'a [BookingRange],
    week_start: Weekday,
    now: DateTime<Utc>,
    exclude: Option<&str>,
) -> Option<&'a BookingRange> {
    let n_start = normalize_to_week(start, week_start, now);
    let n_end = normalize_to_week(end, week_start, now);
    existing
        .iter()
        .filter(|r| exclude != Some(r.id.as_str()))
        .find(|r| {
            let r_start = normalize_to_week(r.start, week_start, now);
            let r_end = normalize_to_week(r.end, week_start, now);
            n_start < r_end && n_end > r_start
        })
}

/// An adjusted, non-conflicting variant of a candidate recurring range.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringAdjustment {
    /// Id of the existing range the candidate collided with.
    pub range_id: String,
    pub suggested_start: DateTime<Utc>,
    pub suggested_end: DateTime<Utc>,
}

/// Suggest how to trim a candidate recurring range so it no longer collides
/// with an existing one. The suggestion stays in the candidate's original
/// week. When the candidate fully engulfs the existing range there is no
/// one-sided trim, and no suggestion is made.
pub fn suggest_recurring_adjustment(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    existing: &[BookingRange],
    week_start: Weekday,
    now: DateTime<Utc>,
) -> Option<RecurringAdjustment> {
    let n_start = normalize_to_week(start, week_start, now);
    let n_end = normalize_to_week(end, week_start, now);
    // Offset from the canonical week back to the candidate's week.
    let week_offset = start - n_start;

    for range in existing {
        let r_start = normalize_to_week(range.start, week_start, now);
        let r_end = normalize_to_week(range.end, week_start, now);
        if n_start >= r_end || n_end <= r_start {
            continue;
        }
        if n_start >= r_start && n_start < r_end {
            return Some(RecurringAdjustment {
                range_id: range.id.clone(),
                suggested_start: r_end + week_offset,
                suggested_end: end,
            });
        }
        if n_end > r_start && n_end <= r_end {
            return Some(RecurringAdjustment {
                range_id: range.id.clone(),
                suggested_start: start,
                suggested_end: r_start + week_offset,
            });
        }
        // Candidate engulfs the existing range; no one-sided trim exists.
    }
    None
}

/// Expand a recurring slot's RRULE into its next `count` occurrences.
///
/// Builds the iCalendar text block (`DTSTART;TZID=...` + `RRULE:`) from the
/// slot's local start time and parses it with the `rrule` crate.
///
/// # Errors
/// Returns `EngineError::InvalidRule` if the slot has no RRULE or the rule
/// does not parse.
pub fn expand_weekly_occurrences(
    slot: &BookingSlot,
    count: u16,
) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
    let rule = slot
        .rrule
        .as_deref()
        .ok_or_else(|| EngineError::InvalidRule("slot has no RRULE".to_string()))?;
    if rule.is_empty() {
        return Err(EngineError::InvalidRule("empty RRULE string".to_string()));
    }

    let dtstart_local = slot.start.with_timezone(&slot.timezone).naive_local();
    let rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        slot.timezone.name(),
        dtstart_local.format("%Y%m%dT%H%M%S"),
        rule
    );

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| EngineError::InvalidRule(format!("{e}")))?;

    let duration = slot.end - slot.start;
    Ok(rrule_set
        .all(count)
        .dates
        .into_iter()
        .map(|dt| {
            let start = dt.with_timezone(&Utc);
            (start, start + duration)
        })
        .collect())
}

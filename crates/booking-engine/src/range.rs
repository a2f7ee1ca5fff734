//! Availability ranges -- owner-declared windows that get sliced into slots.
//!
//! A range is a contiguous window on a single calendar day (legacy cross-day
//! ranges survive updates, see [`crate::validate`]). All functions here are
//! pure: edits return new collections and the current instant is always an
//! explicit argument, never read from a clock.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::{EngineError, Result};

/// Default local start hour for generated ranges (09:00).
pub const DEFAULT_RANGE_START_HOUR: u32 = 9;
/// Default local end hour for generated ranges (17:00).
pub const DEFAULT_RANGE_END_HOUR: u32 = 17;

/// An owner-declared availability window.
///
/// `start`/`end` are stored in UTC; `timezone` records the wall-clock zone
/// the owner declared the window in (slots inherit it).
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRange {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: Tz,
}

/// Resolve a local wall-clock datetime in `tz` to UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times in
/// a DST gap are an error.
pub(crate) fn resolve_local(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| EngineError::InvalidLocalTime(format!("{naive} does not exist in {tz}")))
}

fn local_hour(tz: Tz, day: NaiveDate, hour: u32) -> Result<DateTime<Utc>> {
    let naive = day
        .and_hms_opt(hour, 0, 0)
        .ok_or_else(|| EngineError::InvalidLocalTime(format!("{day} {hour}:00")))?;
    resolve_local(tz, naive)
}

/// First day of the week containing `day`, given the configured week start.
pub(crate) fn start_of_week(day: NaiveDate, week_start: Weekday) -> NaiveDate {
    day - Duration::days(day.weekday().days_since(week_start) as i64)
}

/// The default 09:00-17:00 local range for a given day.
pub fn default_day_range(day: NaiveDate, timezone: Tz) -> Result<BookingRange> {
    Ok(BookingRange {
        id: format!("range-{day}"),
        start: local_hour(timezone, day, DEFAULT_RANGE_START_HOUR)?,
        end: local_hour(timezone, day, DEFAULT_RANGE_END_HOUR)?,
        timezone,
    })
}

/// Generate the default ranges for the week containing `reference`.
///
/// One 09:00-17:00 local range per weekday (Mon-Fri), regardless of where
/// the configured week starts. When `include_past_today` is false, days
/// strictly before the reference day are dropped and the reference day's
/// start is clamped to the next full hour; the reference day is dropped
/// entirely if the clamped start would land at or after 17:00 local.
pub fn default_week_ranges(
    week_start: Weekday,
    reference: DateTime<Utc>,
    timezone: Tz,
    include_past_today: bool,
) -> Result<Vec<BookingRange>> {
    let local_now = reference.with_timezone(&timezone);
    let today = local_now.date_naive();
    let week_anchor = start_of_week(today, week_start);

    let mut ranges = Vec::new();
    for offset in 0..7 {
        let day = week_anchor + Duration::days(offset);
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        if !include_past_today {
            if day < today {
                continue;
            }
            if day == today {
                let mut start_hour = local_now.hour();
                if local_now.minute() > 0 || local_now.second() > 0 {
                    start_hour += 1;
                }
                let start_hour = start_hour.max(DEFAULT_RANGE_START_HOUR);
                if start_hour >= DEFAULT_RANGE_END_HOUR {
                    continue;
                }
                ranges.push(BookingRange {
                    id: format!("range-{day}"),
                    start: local_hour(timezone, day, start_hour)?,
                    end: local_hour(timezone, day, DEFAULT_RANGE_END_HOUR)?,
                    timezone,
                });
                continue;
            }
        }
        ranges.push(default_day_range(day, timezone)?);
    }
    Ok(ranges)
}

/// Find the next day with no declared range and return its default range.
///
/// The candidate day is the week-start-aligned day of `requested_start` when
/// given, otherwise tomorrow. The walk advances one day at a time past days
/// already holding a range; it terminates because the set of occupied days
/// is finite and the walk is monotonic.
pub fn next_available_range(
    existing: &[BookingRange],
    week_start: Weekday,
    timezone: Tz,
    now: DateTime<Utc>,
    requested_start: Option<DateTime<Utc>>,
) -> Result<BookingRange> {
    let mut day = match requested_start {
        Some(requested) => {
            let requested_day = requested.with_timezone(&timezone).date_naive();
            start_of_week(requested_day, week_start)
        }
        None => now.with_timezone(&timezone).date_naive() + Duration::days(1),
    };

    while day_occupied(existing, day, timezone) {
        day += Duration::days(1);
    }

    default_day_range(day, timezone)
}

fn day_occupied(existing: &[BookingRange], day: NaiveDate, timezone: Tz) -> bool {
    existing
        .iter()
        .any(|r| r.start.with_timezone(&timezone).date_naive() == day)
}

/// Return the first existing range conflicting with `[start, end)`.
///
/// Open-interval semantics: touching endpoints are not a conflict. A range
/// whose id equals `exclude` is skipped (in-place edits).
pub fn detect_overlap<'a>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    existing: &'a [BookingRange],
    exclude: Option<&str>,
) -> Option<&'a BookingRange> {
    existing
        .iter()
        .filter(|r| exclude != Some(r.id.as_str()))
        .find(|r| start < r.end && end > r.start)
}

/// Whether `[start, end)` crosses the midnight following its start day (UTC).
///
/// A range ending exactly at the next midnight still counts as a single day.
pub fn spans_multiple_days(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    let next_midnight = Utc.from_utc_datetime(
        &(start.date_naive() + Duration::days(1)).and_time(chrono::NaiveTime::MIN),
    );
    end > next_midnight
}

/// Whether the range is too short to fit a single slot of `duration_minutes`.
pub fn range_shorter_than(range: &BookingRange, duration_minutes: u32) -> bool {
    range.end - range.start < Duration::minutes(duration_minutes as i64)
}

/// Split a legacy midnight-spanning range at the midnight (UTC) following its
/// start. Both halves keep the timezone and get fresh, distinct ids.
pub fn split_midnight_range(range: &BookingRange) -> (BookingRange, BookingRange) {
    let midnight = Utc.from_utc_datetime(
        &(range.start.date_naive() + Duration::days(1)).and_time(chrono::NaiveTime::MIN),
    );
    let first = BookingRange {
        id: format!("{}-1", range.id),
        start: range.start,
        end: midnight,
        timezone: range.timezone,
    };
    let second = BookingRange {
        id: format!("{}-2", range.id),
        start: midnight,
        end: range.end,
        timezone: range.timezone,
    };
    (first, second)
}

/// A copy of `ranges` with `range` appended.
pub fn with_range_added(ranges: &[BookingRange], range: BookingRange) -> Vec<BookingRange> {
    let mut next = ranges.to_vec();
    next.push(range);
    next
}

/// A copy of `ranges` with the range of matching id replaced.
pub fn with_range_updated(ranges: &[BookingRange], range: BookingRange) -> Vec<BookingRange> {
    ranges
        .iter()
        .map(|r| if r.id == range.id { range.clone() } else { r.clone() })
        .collect()
}

/// A copy of `ranges` without the range of the given id.
pub fn with_range_removed(ranges: &[BookingRange], id: &str) -> Vec<BookingRange> {
    ranges.iter().filter(|r| r.id != id).cloned().collect()
}

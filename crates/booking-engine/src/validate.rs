//! Validation rules for booking pages and range operations.
//!
//! All checks return their findings as values -- callers render inline
//! feedback -- and nothing here panics or mutates state. Severity separates
//! blocking errors (submission refused) from warnings (submission
//! discouraged).

use chrono::{DateTime, Utc, Weekday};
use thiserror::Error;

use crate::form::BookingForm;
use crate::range::{detect_overlap, spans_multiple_days, BookingRange};
use crate::recurring::detect_recurring_overlap;

/// Hard ceilings enforced before any encryption happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingLimits {
    pub max_slots: usize,
    pub max_ranges: usize,
}

impl Default for BookingLimits {
    fn default() -> Self {
        BookingLimits {
            max_slots: 50,
            max_ranges: 20,
        }
    }
}

/// Whether a finding blocks submission or merely discourages it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A form-level finding, ordered by check priority.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormIssue {
    #[error("A booking page can hold at most {limit} slots")]
    SlotLimitExceeded { limit: usize },

    #[error("The booking page has no title")]
    EmptyTitle,

    #[error("The booking page has no available slots")]
    NoSlots,
}

impl FormIssue {
    pub fn severity(&self) -> Severity {
        match self {
            FormIssue::SlotLimitExceeded { .. } => Severity::Error,
            FormIssue::EmptyTitle | FormIssue::NoSlots => Severity::Warning,
        }
    }
}

/// Check a form against the configured limits.
///
/// Fixed priority: slot ceiling (blocking), then empty title (warning), then
/// zero slots (warning). The first matching rule wins; `None` means the page
/// may be submitted.
pub fn validate_form(
    form: &BookingForm,
    slot_count: usize,
    limits: &BookingLimits,
) -> Option<FormIssue> {
    if slot_count >= limits.max_slots {
        return Some(FormIssue::SlotLimitExceeded {
            limit: limits.max_slots,
        });
    }
    if form.title.trim().is_empty() {
        return Some(FormIssue::EmptyTitle);
    }
    if slot_count == 0 {
        return Some(FormIssue::NoSlots);
    }
    None
}

/// Why a range add/update was rejected. State is left unchanged; the message
/// is returned as a value, not thrown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeConflict {
    #[error("The range starts in the past")]
    StartInPast,

    #[error("The range spans more than one day")]
    SpansMultipleDays,

    #[error("The range ends at or before it starts")]
    InvertedInterval,

    #[error("A range with id {0} already exists")]
    AlreadyExists(String),

    #[error("The range overlaps the existing range {0}")]
    Overlaps(String),
}

/// Which operation is being validated. `Add` enforces the strict checks;
/// `Update` relaxes the past-start and cross-day checks so legacy data
/// survives editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Add,
    Update,
}

/// Everything a range-operation check needs besides the candidate interval.
#[derive(Debug, Clone)]
pub struct RangeOpContext<'a> {
    pub op: RangeOp,
    pub existing: &'a [BookingRange],
    pub exclude: Option<&'a str>,
    pub recurring: bool,
    pub now: DateTime<Utc>,
    pub week_start: Weekday,
}

/// Validate a range add/update against the existing collection.
///
/// For `Add`: a start in the past and a multi-day span are rejected. For
/// `Update`: both checks are skipped. Then an id collision (except the
/// excluded id) and an interval overlap (except the excluded id) are
/// rejected. Recurring ranges have no calendar-day anchor, so `start >= end`
/// is rejected as an overlap-class error and overlap is evaluated in the
/// normalized week.
pub fn validate_range_op(
    ctx: &RangeOpContext<'_>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    range_id: &str,
) -> Option<RangeConflict> {
    if ctx.op == RangeOp::Add {
        if start < ctx.now {
            return Some(RangeConflict::StartInPast);
        }
        if spans_multiple_days(start, end) {
            return Some(RangeConflict::SpansMultipleDays);
        }
    }

    if ctx
        .existing
        .iter()
        .any(|r| r.id == range_id && ctx.exclude != Some(r.id.as_str()))
    {
        return Some(RangeConflict::AlreadyExists(range_id.to_string()));
    }

    if ctx.recurring {
        if start >= end {
            return Some(RangeConflict::InvertedInterval);
        }
        if let Some(conflicting) =
            detect_recurring_overlap(start, end, ctx.existing, ctx.week_start, ctx.now, ctx.exclude)
        {
            return Some(RangeConflict::Overlaps(conflicting.id.clone()));
        }
    } else if let Some(conflicting) = detect_overlap(start, end, ctx.existing, ctx.exclude) {
        return Some(RangeConflict::Overlaps(conflicting.id.clone()));
    }

    None
}

//! Tests for form validation and range-operation rules.

use booking_engine::form::{BookingForm, FormUpdate};
use booking_engine::range::BookingRange;
use booking_engine::validate::{
    validate_form, validate_range_op, BookingLimits, FormIssue, RangeConflict, RangeOp,
    RangeOpContext, Severity,
};
use chrono::{DateTime, Utc, Weekday};

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn range(id: &str, start: &str, end: &str) -> BookingRange {
    BookingRange {
        id: id.to_string(),
        start: at(start),
        end: at(end),
        timezone: chrono_tz::UTC,
    }
}

fn titled_form() -> BookingForm {
    BookingForm::new(chrono_tz::UTC).apply(FormUpdate::Title("Office hours".to_string()))
}

const NOW: &str = "2026-01-15T10:30:00Z";

fn ctx<'a>(
    op: RangeOp,
    existing: &'a [BookingRange],
    exclude: Option<&'a str>,
    recurring: bool,
) -> RangeOpContext<'a> {
    RangeOpContext {
        op,
        existing,
        exclude,
        recurring,
        now: at(NOW),
        week_start: Weekday::Mon,
    }
}

// ── Form validation priority ────────────────────────────────────────────────

#[test]
fn slot_ceiling_outranks_missing_title() {
    let form = BookingForm::new(chrono_tz::UTC);
    let limits = BookingLimits::default();

    let issue = validate_form(&form, limits.max_slots, &limits).unwrap();

    assert_eq!(issue, FormIssue::SlotLimitExceeded { limit: 50 });
    assert_eq!(issue.severity(), Severity::Error);
    assert!(issue.to_string().contains("50"));
}

#[test]
fn missing_title_is_a_warning() {
    let form = BookingForm::new(chrono_tz::UTC).apply(FormUpdate::Title("   ".to_string()));

    let issue = validate_form(&form, 3, &BookingLimits::default()).unwrap();

    assert_eq!(issue, FormIssue::EmptyTitle);
    assert_eq!(issue.severity(), Severity::Warning);
}

#[test]
fn zero_slots_is_a_warning() {
    let issue = validate_form(&titled_form(), 0, &BookingLimits::default()).unwrap();

    assert_eq!(issue, FormIssue::NoSlots);
    assert_eq!(issue.severity(), Severity::Warning);
}

#[test]
fn valid_form_passes() {
    assert!(validate_form(&titled_form(), 3, &BookingLimits::default()).is_none());
}

// ── Range operations ────────────────────────────────────────────────────────

#[test]
fn add_rejects_start_in_the_past() {
    let conflict = validate_range_op(
        &ctx(RangeOp::Add, &[], None, false),
        at("2026-01-14T09:00:00Z"),
        at("2026-01-14T10:00:00Z"),
        "new",
    );

    assert_eq!(conflict, Some(RangeConflict::StartInPast));
}

#[test]
fn add_rejects_multi_day_span() {
    let conflict = validate_range_op(
        &ctx(RangeOp::Add, &[], None, false),
        at("2026-01-16T22:00:00Z"),
        at("2026-01-17T02:00:00Z"),
        "new",
    );

    assert_eq!(conflict, Some(RangeConflict::SpansMultipleDays));
}

#[test]
fn update_relaxes_past_and_multi_day_checks() {
    // A legacy cross-day range in the past survives an update untouched.
    let conflict = validate_range_op(
        &ctx(RangeOp::Update, &[], None, false),
        at("2026-01-10T22:00:00Z"),
        at("2026-01-11T02:00:00Z"),
        "legacy",
    );

    assert!(conflict.is_none());
}

#[test]
fn duplicate_id_is_rejected() {
    let existing = vec![range("a", "2026-01-16T09:00:00Z", "2026-01-16T10:00:00Z")];

    let conflict = validate_range_op(
        &ctx(RangeOp::Add, &existing, None, false),
        at("2026-01-16T11:00:00Z"),
        at("2026-01-16T12:00:00Z"),
        "a",
    );

    assert_eq!(conflict, Some(RangeConflict::AlreadyExists("a".to_string())));
}

#[test]
fn overlap_with_distinct_id_is_rejected() {
    let existing = vec![range("a", "2026-01-16T09:00:00Z", "2026-01-16T10:00:00Z")];

    let conflict = validate_range_op(
        &ctx(RangeOp::Add, &existing, None, false),
        at("2026-01-16T09:30:00Z"),
        at("2026-01-16T10:30:00Z"),
        "b",
    );

    assert_eq!(conflict, Some(RangeConflict::Overlaps("a".to_string())));
}

#[test]
fn disjoint_range_passes() {
    let existing = vec![range("a", "2026-01-16T09:00:00Z", "2026-01-16T10:00:00Z")];

    let conflict = validate_range_op(
        &ctx(RangeOp::Add, &existing, None, false),
        at("2026-01-16T11:00:00Z"),
        at("2026-01-16T12:00:00Z"),
        "b",
    );

    assert!(conflict.is_none());
}

#[test]
fn excluded_id_is_skipped_during_update_but_others_checked() {
    let existing = vec![
        range("a", "2026-01-16T09:00:00Z", "2026-01-16T11:00:00Z"),
        range("b", "2026-01-16T10:00:00Z", "2026-01-16T12:00:00Z"),
    ];

    // Editing "a" onto itself is fine...
    let own = validate_range_op(
        &ctx(RangeOp::Update, &existing, Some("a"), false),
        at("2026-01-16T09:00:00Z"),
        at("2026-01-16T09:30:00Z"),
        "a",
    );
    assert!(own.is_none());

    // ...but moving it over "b" is still a conflict.
    let other = validate_range_op(
        &ctx(RangeOp::Update, &existing, Some("a"), false),
        at("2026-01-16T10:30:00Z"),
        at("2026-01-16T11:30:00Z"),
        "a",
    );
    assert_eq!(other, Some(RangeConflict::Overlaps("b".to_string())));
}

#[test]
fn recurring_inverted_interval_is_rejected() {
    let conflict = validate_range_op(
        &ctx(RangeOp::Add, &[], None, true),
        at("2026-01-16T12:00:00Z"),
        at("2026-01-16T11:00:00Z"),
        "new",
    );

    assert_eq!(conflict, Some(RangeConflict::InvertedInterval));
}

#[test]
fn recurring_overlap_is_detected_across_weeks() {
    // Existing Friday range this week; candidate Friday range two weeks out.
    let existing = vec![range("a", "2026-01-16T09:00:00Z", "2026-01-16T10:00:00Z")];

    let conflict = validate_range_op(
        &ctx(RangeOp::Add, &existing, None, true),
        at("2026-01-30T09:30:00Z"),
        at("2026-01-30T10:30:00Z"),
        "b",
    );

    assert_eq!(conflict, Some(RangeConflict::Overlaps("a".to_string())));
}

// ── Typed form updates ──────────────────────────────────────────────────────

#[test]
fn form_updates_are_pure() {
    let form = BookingForm::new(chrono_tz::UTC);

    let updated = form
        .apply(FormUpdate::Title("Standup".to_string()))
        .apply(FormUpdate::DurationMinutes(15))
        .apply(FormUpdate::Recurring(true));

    assert_eq!(form.title, "");
    assert_eq!(form.duration_minutes, 30);
    assert_eq!(updated.title, "Standup");
    assert_eq!(updated.duration_minutes, 15);
    assert!(updated.recurring);
}

//! # booking-engine
//!
//! Pure scheduling and validation core for encrypted booking pages.
//!
//! Turns owner-declared availability windows into a bounded set of
//! fixed-duration slots, detects conflicts, and supports recurring weekly
//! patterns. Everything here is synchronous, deterministic, and free of
//! shared mutable state: edits return new collections and the current
//! instant is always an explicit argument.
//!
//! ## Modules
//!
//! - [`range`] — availability windows: default week generation,
//!   next-available search, overlap detection, pure collection edits
//! - [`slot`] — slicing a range into fixed-duration bookable slots
//! - [`recurring`] — weekly patterns: canonical-week normalization,
//!   weekday grouping, RRULE expansion
//! - [`form`] — typed form model with closed-set update commands
//! - [`validate`] — rule checks over forms and range operations
//! - [`error`] — error types

pub mod error;
pub mod form;
pub mod range;
pub mod recurring;
pub mod slot;
pub mod validate;

pub use error::EngineError;
pub use form::{BookingForm, FormUpdate, LocationType};
pub use range::{
    default_week_ranges, detect_overlap, next_available_range, split_midnight_range,
    with_range_added, with_range_removed, with_range_updated, BookingRange,
};
pub use recurring::{normalize_to_week, recurring_week, RecurringWeek};
pub use slot::{slots_in_range, BookingSlot};
pub use validate::{
    validate_form, validate_range_op, BookingLimits, FormIssue, RangeConflict, RangeOp,
    RangeOpContext, Severity,
};

//! Typed form model for a booking page.
//!
//! Field updates are a closed set of commands, one variant per field, each
//! carrying its own value type. [`BookingForm::apply`] is a pure
//! transformation: it returns a new form and never mutates in place.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Where a booked meeting takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocationType {
    InPerson,
    #[default]
    Virtual,
}

/// Owner-editable booking page data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub location_type: LocationType,
    pub with_meeting_link: bool,
    pub duration_minutes: u32,
    pub timezone: Tz,
    pub recurring: bool,
}

impl BookingForm {
    /// A fresh form in the given timezone with 30-minute slots.
    pub fn new(timezone: Tz) -> Self {
        BookingForm {
            title: String::new(),
            description: String::new(),
            location: String::new(),
            location_type: LocationType::default(),
            with_meeting_link: false,
            duration_minutes: 30,
            timezone,
            recurring: false,
        }
    }

    /// Apply a single field update, returning the new form.
    pub fn apply(&self, update: FormUpdate) -> BookingForm {
        let mut next = self.clone();
        match update {
            FormUpdate::Title(v) => next.title = v,
            FormUpdate::Description(v) => next.description = v,
            FormUpdate::Location(v) => next.location = v,
            FormUpdate::LocationType(v) => next.location_type = v,
            FormUpdate::WithMeetingLink(v) => next.with_meeting_link = v,
            FormUpdate::DurationMinutes(v) => next.duration_minutes = v,
            FormUpdate::Timezone(v) => next.timezone = v,
            FormUpdate::Recurring(v) => next.recurring = v,
        }
        next
    }
}

/// One typed update command per form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormUpdate {
    Title(String),
    Description(String),
    Location(String),
    LocationType(LocationType),
    WithMeetingLink(bool),
    DurationMinutes(u32),
    Timezone(Tz),
    Recurring(bool),
}

//! End-to-end tests for the booking session: create, encrypt, read back,
//! recover, and edit.

use booking_engine::{BookingRange, FormUpdate, RangeConflict};
use booking_envelope::envelope::OwnerKeys;
use booking_envelope::error::CryptoError;
use booking_envelope::kdf::derive_booking_uid;
use booking_envelope::link::parse_booking_link;
use booking_envelope::payload::{BookingReadResponse, CreateBookingPayload};
use booking_envelope::session::{read_booking, recover_secret, BookingSession};
use chrono::{DateTime, Utc, Weekday};

const CALENDAR_ID: &str = "cal-primary";
const HOST: &str = "calendar.example.com";

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn range(id: &str, start: &str, end: &str) -> BookingRange {
    BookingRange {
        id: id.to_string(),
        start: at(start),
        end: at(end),
        timezone: chrono_tz::Europe::Zurich,
    }
}

// Thursday morning; all fixture ranges lie on the following Friday.
const NOW: &str = "2026-01-15T10:30:00Z";

fn populated_session() -> BookingSession {
    let mut session =
        BookingSession::create(CALENDAR_ID, chrono_tz::Europe::Zurich, Weekday::Mon).unwrap();
    session.apply(FormUpdate::Title("Office hours".to_string()));
    session.apply(FormUpdate::Description("Drop in".to_string()));
    session.apply(FormUpdate::DurationMinutes(60));
    let conflict = session.add_range(
        range("friday", "2026-01-16T08:00:00Z", "2026-01-16T10:00:00Z"),
        at(NOW),
    );
    assert!(conflict.is_none());
    session
}

/// What the server would hand back after storing a create payload.
fn as_read_response(payload: &CreateBookingPayload) -> BookingReadResponse {
    BookingReadResponse {
        encrypted_secret: payload.encrypted_secret.clone(),
        secret_signature: payload.secret_signature.clone(),
        encrypted_content: payload.encrypted_content.clone(),
        content_signature: payload.content_signature.clone(),
        booking_key_salt: payload.booking_key_salt.clone(),
        slots: payload.slots.clone(),
    }
}

// ── Create and read back ────────────────────────────────────────────────────

#[test]
fn create_then_read_via_link_round_trips() {
    let owner = OwnerKeys::generate();
    let calendar = OwnerKeys::generate();
    let session = populated_session();

    let (payload, link) = session
        .build_create_payload(&owner, &calendar.encryption_public(), HOST)
        .unwrap();

    // A visitor opens the link and reads the page back.
    let secret = parse_booking_link(&link).unwrap();
    let booking = read_booking(
        CALENDAR_ID,
        &secret,
        &as_read_response(&payload),
        &[owner.verifying_key()],
    )
    .unwrap();

    assert_eq!(booking.content.summary, "Office hours");
    assert_eq!(booking.content.description, "Drop in");
    assert_eq!(booking.slots.len(), 2);
    assert_eq!(booking.slots[0].start, at("2026-01-16T08:00:00Z"));
    assert_eq!(booking.slots[1].start, at("2026-01-16T09:00:00Z"));
    assert!(!booking.content_outcome.failed_to_verify);
    assert!(!booking.slots_outcome.failed_to_verify);
}

#[test]
fn payload_uid_matches_link_secret() {
    let owner = OwnerKeys::generate();
    let calendar = OwnerKeys::generate();
    let session = populated_session();

    let (payload, link) = session
        .build_create_payload(&owner, &calendar.encryption_public(), HOST)
        .unwrap();

    let secret = parse_booking_link(&link).unwrap();
    let uid = derive_booking_uid(&secret).unwrap();
    assert_eq!(payload.booking_uid, uid.to_string());
}

#[test]
fn owner_recovers_secret_without_the_link() {
    let owner = OwnerKeys::generate();
    let calendar = OwnerKeys::generate();
    let session = populated_session();

    let (payload, link) = session
        .build_create_payload(&owner, &calendar.encryption_public(), HOST)
        .unwrap();
    let response = as_read_response(&payload);

    let (recovered, outcome) = recover_secret(
        &response,
        &owner.encryption,
        &[owner.verifying_key()],
        CALENDAR_ID,
    )
    .unwrap();

    assert!(!outcome.failed_to_verify);
    assert_eq!(recovered, parse_booking_link(&link).unwrap());
}

#[test]
fn tampered_content_signature_is_flagged_but_readable() {
    let owner = OwnerKeys::generate();
    let calendar = OwnerKeys::generate();
    let session = populated_session();

    let (payload, link) = session
        .build_create_payload(&owner, &calendar.encryption_public(), HOST)
        .unwrap();
    let mut response = as_read_response(&payload);
    // Swap in the secret's signature; wrong context, so it cannot verify.
    response.content_signature = payload.secret_signature.clone();

    let secret = parse_booking_link(&link).unwrap();
    let booking =
        read_booking(CALENDAR_ID, &secret, &response, &[owner.verifying_key()]).unwrap();

    assert_eq!(booking.content.summary, "Office hours");
    assert!(booking.content_outcome.failed_to_verify);
    assert!(!booking.slots_outcome.failed_to_verify);
}

#[test]
fn stripped_slot_signatures_flag_the_batch() {
    let owner = OwnerKeys::generate();
    let calendar = OwnerKeys::generate();
    let session = populated_session();

    let (payload, link) = session
        .build_create_payload(&owner, &calendar.encryption_public(), HOST)
        .unwrap();
    let mut response = as_read_response(&payload);
    for slot in &mut response.slots {
        slot.detached_signature = None;
    }

    let secret = parse_booking_link(&link).unwrap();
    let booking =
        read_booking(CALENDAR_ID, &secret, &response, &[owner.verifying_key()]).unwrap();

    assert!(booking.slots_outcome.failed_to_verify);
    assert_eq!(booking.slots.len(), 2);
}

#[test]
fn recurring_session_slots_carry_the_weekly_rule() {
    let owner = OwnerKeys::generate();
    let calendar = OwnerKeys::generate();
    let mut session = populated_session();
    session.apply(FormUpdate::Recurring(true));

    let (payload, _) = session
        .build_create_payload(&owner, &calendar.encryption_public(), HOST)
        .unwrap();

    assert!(payload
        .slots
        .iter()
        .all(|s| s.rrule.as_deref() == Some("FREQ=WEEKLY")));
}

// ── Range edits ─────────────────────────────────────────────────────────────

#[test]
fn conflicting_add_leaves_the_session_unchanged() {
    let mut session = populated_session();
    let before = session.ranges.clone();

    let conflict = session.add_range(
        range("clash", "2026-01-16T09:00:00Z", "2026-01-16T11:00:00Z"),
        at(NOW),
    );

    assert_eq!(conflict, Some(RangeConflict::Overlaps("friday".to_string())));
    assert_eq!(session.ranges, before);
}

#[test]
fn update_moves_a_range_in_place() {
    let mut session = populated_session();

    let conflict = session.update_range(
        range("friday", "2026-01-16T12:00:00Z", "2026-01-16T14:00:00Z"),
        at(NOW),
    );

    assert!(conflict.is_none());
    assert_eq!(session.ranges.len(), 1);
    assert_eq!(session.ranges[0].start, at("2026-01-16T12:00:00Z"));
}

#[test]
fn remove_range_drops_only_the_named_id() {
    let mut session = populated_session();
    let conflict = session.add_range(
        range("later", "2026-01-16T12:00:00Z", "2026-01-16T13:00:00Z"),
        at(NOW),
    );
    assert!(conflict.is_none());

    session.remove_range("friday");

    assert_eq!(session.ranges.len(), 1);
    assert_eq!(session.ranges[0].id, "later");
}

// ── Submission gating ───────────────────────────────────────────────────────

#[test]
fn slot_ceiling_blocks_submission() {
    let owner = OwnerKeys::generate();
    let calendar = OwnerKeys::generate();
    let mut session = populated_session();
    // 8 hours of 5-minute slots per weekday blows past the 50-slot ceiling.
    session.apply(FormUpdate::DurationMinutes(5));
    for (id, day) in [("mon", 19), ("tue", 20), ("wed", 21)] {
        let conflict = session.add_range(
            range(
                id,
                &format!("2026-01-{day}T08:00:00Z"),
                &format!("2026-01-{day}T16:00:00Z"),
            ),
            at(NOW),
        );
        assert!(conflict.is_none());
    }

    let result = session.build_create_payload(&owner, &calendar.encryption_public(), HOST);

    assert!(matches!(result, Err(CryptoError::Blocked(_))));
}

#[test]
fn empty_title_warns_but_does_not_block() {
    let owner = OwnerKeys::generate();
    let calendar = OwnerKeys::generate();
    let mut session = populated_session();
    session.apply(FormUpdate::Title(String::new()));

    assert!(session.validate().is_some());
    let result = session.build_create_payload(&owner, &calendar.encryption_public(), HOST);
    assert!(result.is_ok());
}

// ── Edit payload ────────────────────────────────────────────────────────────

#[test]
fn edit_payload_reencrypts_content_and_slots() {
    let owner = OwnerKeys::generate();
    let calendar = OwnerKeys::generate();
    let mut session = populated_session();
    session.apply(FormUpdate::Title("Office hours (moved)".to_string()));

    let edit = session
        .build_edit_payload(&owner, &calendar.encryption_public())
        .unwrap();

    assert_eq!(edit.slots.len(), 2);
    assert!(edit.content_signature.is_some());
    assert!(!edit.encrypted_content.is_empty());
}

//! Per-flow booking session -- explicit state for one creation/edit flow.
//!
//! A session is constructed once per flow and passed by reference wherever
//! booking state is needed; there is no ambient or global lookup. It owns
//! the secret, salt, derived key material, form, and range collection for
//! its lifetime. Range edits go through the validation engine and replace
//! the collection wholesale, so a failed edit leaves the session untouched.
//!
//! Submission is all-or-nothing: `build_create_payload` refuses on any
//! blocking validation finding or limit breach before touching a single
//! cryptographic primitive, and any per-slot encryption failure discards
//! every completed envelope.

use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use ed25519_dalek::VerifyingKey;
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};

use booking_engine::{
    slots_in_range, validate_form, validate_range_op, with_range_added, with_range_removed,
    with_range_updated, BookingForm, BookingLimits, BookingRange, BookingSlot, FormIssue,
    FormUpdate, RangeConflict, RangeOp, RangeOpContext, Severity,
};

use crate::envelope::{
    decrypt_and_verify_content, decrypt_and_verify_secret, encrypt_content, encrypt_secret,
    encrypt_slots, verify_slot_signatures, BookingContent, OwnerKeys, VerificationOutcome,
};
use crate::error::{CryptoError, Result};
use crate::kdf::{
    derive_booking_key, derive_booking_uid, BookingKey, BookingKeySalt, BookingSecret, BookingUid,
};
use crate::link::format_booking_link;
use crate::payload::{
    encode_bytes, encode_signature, BookingReadResponse, CreateBookingPayload, EditBookingPayload,
    SlotPayload,
};

/// Weekly recurrence rule attached to every slot of a recurring page.
const WEEKLY_RRULE: &str = "FREQ=WEEKLY";

/// One booking-page creation or edit flow.
pub struct BookingSession {
    calendar_id: String,
    secret: BookingSecret,
    salt: BookingKeySalt,
    key: BookingKey,
    uid: BookingUid,
    pub form: BookingForm,
    pub ranges: Vec<BookingRange>,
    pub limits: BookingLimits,
    pub week_start: Weekday,
}

impl BookingSession {
    /// Start a fresh flow: new random secret and salt, derived key and uid.
    pub fn create(calendar_id: impl Into<String>, timezone: Tz, week_start: Weekday) -> Result<Self> {
        Self::resume(
            calendar_id,
            BookingSecret::generate(),
            BookingKeySalt::generate(),
            timezone,
            week_start,
        )
    }

    /// Resume a flow from existing key material (read or edit path).
    pub fn resume(
        calendar_id: impl Into<String>,
        secret: BookingSecret,
        salt: BookingKeySalt,
        timezone: Tz,
        week_start: Weekday,
    ) -> Result<Self> {
        let calendar_id = calendar_id.into();
        let key = derive_booking_key(&secret, &salt, &calendar_id)?;
        let uid = derive_booking_uid(&secret)?;
        Ok(BookingSession {
            calendar_id,
            secret,
            salt,
            key,
            uid,
            form: BookingForm::new(timezone),
            ranges: Vec::new(),
            limits: BookingLimits::default(),
            week_start,
        })
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    pub fn uid(&self) -> &BookingUid {
        &self.uid
    }

    pub fn booking_key(&self) -> &BookingKey {
        &self.key
    }

    /// Apply a typed form update.
    pub fn apply(&mut self, update: FormUpdate) {
        self.form = self.form.apply(update);
    }

    /// Add a range after validation. On conflict the collection is unchanged
    /// and the conflict is returned as a value.
    pub fn add_range(&mut self, range: BookingRange, now: DateTime<Utc>) -> Option<RangeConflict> {
        let ctx = RangeOpContext {
            op: RangeOp::Add,
            existing: &self.ranges,
            exclude: None,
            recurring: self.form.recurring,
            now,
            week_start: self.week_start,
        };
        if let Some(conflict) = validate_range_op(&ctx, range.start, range.end, &range.id) {
            return Some(conflict);
        }
        self.ranges = with_range_added(&self.ranges, range);
        None
    }

    /// Update a range in place (by id) after validation. The past-start and
    /// cross-day checks are relaxed so legacy ranges survive editing.
    pub fn update_range(
        &mut self,
        range: BookingRange,
        now: DateTime<Utc>,
    ) -> Option<RangeConflict> {
        let ctx = RangeOpContext {
            op: RangeOp::Update,
            existing: &self.ranges,
            exclude: Some(range.id.as_str()),
            recurring: self.form.recurring,
            now,
            week_start: self.week_start,
        };
        if let Some(conflict) = validate_range_op(&ctx, range.start, range.end, &range.id) {
            return Some(conflict);
        }
        self.ranges = with_range_updated(&self.ranges, range);
        None
    }

    pub fn remove_range(&mut self, id: &str) {
        self.ranges = with_range_removed(&self.ranges, id);
    }

    /// Slice every range into slots of the form's duration. Slots of a
    /// recurring page carry the weekly RRULE.
    pub fn slots(&self) -> Vec<BookingSlot> {
        let rrule = self.form.recurring.then_some(WEEKLY_RRULE);
        self.ranges
            .iter()
            .flat_map(|range| slots_in_range(range, self.form.duration_minutes, rrule))
            .collect()
    }

    /// Current validation finding, if any.
    pub fn validate(&self) -> Option<FormIssue> {
        validate_form(&self.form, self.slots().len(), &self.limits)
    }

    /// The booking content derived from the form.
    pub fn content(&self) -> BookingContent {
        BookingContent {
            summary: self.form.title.clone(),
            description: self.form.description.clone(),
            location: self.form.location.clone(),
            location_type: self.form.location_type,
            with_meeting_link: self.form.with_meeting_link,
        }
    }

    fn check_ceilings(&self, slots: &[BookingSlot]) -> Result<()> {
        if let Some(issue) = validate_form(&self.form, slots.len(), &self.limits) {
            if issue.severity() == Severity::Error {
                return Err(CryptoError::Blocked(issue.to_string()));
            }
        }
        if self.ranges.len() > self.limits.max_ranges {
            return Err(CryptoError::LimitExceeded {
                what: "ranges",
                limit: self.limits.max_ranges,
            });
        }
        Ok(())
    }

    fn encrypted_slot_payloads(
        &self,
        slots: &[BookingSlot],
        owner: &OwnerKeys,
        calendar_public: &X25519Public,
    ) -> Result<Vec<SlotPayload>> {
        let envelopes = encrypt_slots(slots, &self.key, calendar_public, &owner.signing, &self.uid)?;
        // Envelopes line up with slots by index.
        Ok(slots
            .iter()
            .zip(envelopes.iter())
            .map(|(slot, envelope)| SlotPayload::from_parts(slot, envelope))
            .collect())
    }

    /// Encrypt and sign everything for page creation; returns the payload
    /// and the shareable link.
    pub fn build_create_payload(
        &self,
        owner: &OwnerKeys,
        calendar_public: &X25519Public,
        host: &str,
    ) -> Result<(CreateBookingPayload, String)> {
        let slots = self.slots();
        self.check_ceilings(&slots)?;

        let encrypted_secret = encrypt_secret(
            &self.secret,
            &owner.encryption_public(),
            &owner.signing,
            &self.calendar_id,
        )?;
        let encrypted_content =
            encrypt_content(&self.content(), &self.key, &owner.signing, &self.uid)?;
        let slot_payloads = self.encrypted_slot_payloads(&slots, owner, calendar_public)?;

        let payload = CreateBookingPayload {
            booking_uid: self.uid.to_string(),
            booking_key_salt: encode_bytes(self.salt.as_bytes()),
            encrypted_secret: encode_bytes(&encrypted_secret.key_packet),
            secret_signature: Some(encode_signature(&encrypted_secret.signature)),
            encrypted_content: encode_bytes(&encrypted_content.ciphertext),
            content_signature: Some(encode_signature(&encrypted_content.signature)),
            slots: slot_payloads,
        };
        let link = format_booking_link(host, &self.secret);
        Ok((payload, link))
    }

    /// Re-encrypt content and slots for an edit of an existing page. The
    /// same keys are re-derived; the secret and salt are untouched.
    pub fn build_edit_payload(
        &self,
        owner: &OwnerKeys,
        calendar_public: &X25519Public,
    ) -> Result<EditBookingPayload> {
        let slots = self.slots();
        self.check_ceilings(&slots)?;

        let encrypted_content =
            encrypt_content(&self.content(), &self.key, &owner.signing, &self.uid)?;
        let slot_payloads = self.encrypted_slot_payloads(&slots, owner, calendar_public)?;

        Ok(EditBookingPayload {
            encrypted_content: encode_bytes(&encrypted_content.ciphertext),
            content_signature: Some(encode_signature(&encrypted_content.signature)),
            slots: slot_payloads,
        })
    }
}

/// A fully decrypted booking page with its verification outcomes.
#[derive(Debug)]
pub struct DecryptedBooking {
    pub content: BookingContent,
    pub slots: Vec<BookingSlot>,
    pub content_outcome: VerificationOutcome,
    pub slots_outcome: VerificationOutcome,
}

/// Recover the root secret from a read response (owner path).
///
/// The owner decrypts the sealed secret with their own X25519 key instead of
/// re-deriving it from the link.
pub fn recover_secret(
    response: &BookingReadResponse,
    owner_encryption: &StaticSecret,
    verify_keys: &[VerifyingKey],
    calendar_id: &str,
) -> Result<(BookingSecret, VerificationOutcome)> {
    let packet = response.encrypted_secret_bytes()?;
    let signature = response.secret_signature_parsed()?;
    decrypt_and_verify_secret(
        &packet,
        signature.as_ref(),
        owner_encryption,
        verify_keys,
        calendar_id,
    )
}

/// Decrypt and verify a stored booking page from the link's secret.
///
/// The booking key and uid are re-derived from the secret and the response
/// salt. Decryption failure is fatal; verification failures only set the
/// outcome flags.
pub fn read_booking(
    calendar_id: &str,
    secret: &BookingSecret,
    response: &BookingReadResponse,
    verify_keys: &[VerifyingKey],
) -> Result<DecryptedBooking> {
    let salt = BookingKeySalt::from_bytes(&response.booking_key_salt_bytes()?)?;
    let key = derive_booking_key(secret, &salt, calendar_id)?;
    let uid = derive_booking_uid(secret)?;

    let ciphertext = response.encrypted_content_bytes()?;
    let content_signature = response.content_signature_parsed()?;
    let (content, content_outcome) = decrypt_and_verify_content(
        &ciphertext,
        content_signature.as_ref(),
        &key,
        verify_keys,
        &uid,
    )?;

    let parsed_slots: Vec<_> = response
        .slots
        .iter()
        .map(SlotPayload::to_slot)
        .collect::<Result<_>>()?;
    let slots_outcome = verify_slot_signatures(&parsed_slots, verify_keys, &uid)?;
    let slots = parsed_slots.into_iter().map(|(slot, _)| slot).collect();

    Ok(DecryptedBooking {
        content,
        slots,
        content_outcome,
        slots_outcome,
    })
}

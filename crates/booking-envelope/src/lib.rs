//! # booking-envelope
//!
//! Cryptographic envelope protocol for encrypted booking pages.
//!
//! A single root secret, carried only in the public link's URL fragment,
//! deterministically yields a public booking uid and a per-calendar booking
//! key. Everything the server stores -- the secret itself, the booking
//! content, the slot session keys -- is encrypted and signed client-side;
//! the server never sees plaintext booking data.
//!
//! ## Modules
//!
//! - [`kdf`] — root secret, salt, and HKDF sub-key/uid derivation
//! - [`envelope`] — encrypt, sign, decrypt, and verify booking artifacts
//! - [`canonical`] — byte-stable JSON for signed payloads
//! - [`link`] — the public link carrying the secret in its fragment
//! - [`payload`] — wire payloads for the external booking API
//! - [`session`] — explicit per-flow session object tying it all together
//! - [`error`] — error types

pub mod canonical;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod link;
pub mod payload;
pub mod session;

pub use canonical::canonical_json;
pub use envelope::{
    decrypt_and_verify_content, decrypt_and_verify_secret, encrypt_content, encrypt_secret,
    encrypt_slot, encrypt_slots, verify_slot_signatures, BookingContent, EncryptedContent,
    EncryptedSecret, OwnerKeys, SlotEnvelope, VerificationOutcome,
};
pub use error::CryptoError;
pub use kdf::{
    derive_booking_key, derive_booking_uid, BookingKey, BookingKeySalt, BookingSecret, BookingUid,
};
pub use link::{format_booking_link, parse_booking_link};
pub use payload::{BookingReadResponse, CreateBookingPayload, EditBookingPayload, SlotPayload};
pub use session::{read_booking, recover_secret, BookingSession, DecryptedBooking};

//! Key derivation -- sub-keys and identifiers from the root booking secret.
//!
//! Pure HKDF-SHA256, no I/O, no hidden state. The booking uid depends on the
//! secret alone (calendar-independent); the booking key additionally binds
//! the calendar id through its info string, so a reused secret still yields
//! distinct keys per calendar. Neither output allows recovery of the secret.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hkdf::Hkdf;
use rand_core::{OsRng, RngCore};
use sha2::Sha256;

use crate::error::{CryptoError, Result};

/// Length of the root booking secret in bytes.
pub const SECRET_LEN: usize = 32;
/// Length of the per-calendar booking key salt in bytes.
pub const SALT_LEN: usize = 32;
/// Length of derived keys and uids in bytes.
pub const KEY_LEN: usize = 32;

const BOOKING_KEY_INFO_PREFIX: &str = "bookings.booking_key.";
const BOOKING_ID_INFO: &[u8] = b"bookings.booking_id";

/// The root random value authorizing access to a booking page. Generated
/// once at page creation; travels only in the link fragment.
#[derive(Clone, PartialEq, Eq)]
pub struct BookingSecret([u8; SECRET_LEN]);

impl BookingSecret {
    /// Generate a fresh random secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut bytes);
        BookingSecret(bytes)
    }

    /// Wrap existing bytes, checking the length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; SECRET_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!("secret must be {SECRET_LEN} bytes"))
        })?;
        Ok(BookingSecret(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.0
    }
}

impl fmt::Debug for BookingSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BookingSecret(..)")
    }
}

/// Random per-calendar salt for booking key derivation. Public data: it is
/// stored server-side next to the encrypted artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingKeySalt([u8; SALT_LEN]);

impl BookingKeySalt {
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);
        BookingKeySalt(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; SALT_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidInput(format!("salt must be {SALT_LEN} bytes")))?;
        Ok(BookingKeySalt(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

/// Symmetric key for a booking page on one calendar. Recomputable by anyone
/// holding the secret and salt; never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct BookingKey([u8; KEY_LEN]);

impl BookingKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for BookingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BookingKey(..)")
    }
}

/// Public, stable booking identifier. Derived from the secret alone, so the
/// same secret yields the same uid on every calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingUid([u8; KEY_LEN]);

impl BookingUid {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Display for BookingUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}

/// Derive the per-calendar booking key.
///
/// HKDF-SHA256 with `ikm = secret`, `salt = salt`, and
/// `info = "bookings.booking_key." + calendar_id`.
///
/// # Errors
/// Returns `CryptoError::InvalidInput` when `calendar_id` is empty. Secret
/// and salt lengths are enforced by their constructors.
pub fn derive_booking_key(
    secret: &BookingSecret,
    salt: &BookingKeySalt,
    calendar_id: &str,
) -> Result<BookingKey> {
    if calendar_id.is_empty() {
        return Err(CryptoError::InvalidInput(
            "calendar id must not be empty".to_string(),
        ));
    }
    let hk = Hkdf::<Sha256>::new(Some(salt.as_bytes()), secret.as_bytes());
    let info = format!("{BOOKING_KEY_INFO_PREFIX}{calendar_id}");
    let mut okm = [0u8; KEY_LEN];
    hk.expand(info.as_bytes(), &mut okm)
        .map_err(|_| CryptoError::InvalidInput("HKDF output length".to_string()))?;
    Ok(BookingKey(okm))
}

/// Derive the calendar-independent booking uid.
///
/// Same primitive as [`derive_booking_key`] with an empty salt and
/// `info = "bookings.booking_id"`.
pub fn derive_booking_uid(secret: &BookingSecret) -> Result<BookingUid> {
    let hk = Hkdf::<Sha256>::new(None, secret.as_bytes());
    let mut okm = [0u8; KEY_LEN];
    hk.expand(BOOKING_ID_INFO, &mut okm)
        .map_err(|_| CryptoError::InvalidInput("HKDF output length".to_string()))?;
    Ok(BookingUid(okm))
}

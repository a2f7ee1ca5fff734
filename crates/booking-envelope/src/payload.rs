//! Wire payloads exchanged with the external booking API.
//!
//! Times are Unix seconds; binary fields are unpadded base64url. Signature
//! fields are optional on the read path -- an absent signature is handled by
//! verification, not by deserialization.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};

use booking_engine::BookingSlot;

use crate::envelope::SlotEnvelope;
use crate::error::{CryptoError, Result};

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|_| CryptoError::InvalidInput(format!("{field} is not base64url")))
}

fn decode_signature(field: &str, value: Option<&str>) -> Result<Option<Signature>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let bytes = decode_field(field, value)?;
    let bytes: [u8; 64] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidInput(format!("{field} must be 64 bytes")))?;
    Ok(Some(Signature::from_bytes(&bytes)))
}

fn decode_time(field: &str, value: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(value, 0)
        .ok_or_else(|| CryptoError::InvalidInput(format!("{field} is out of range")))
}

/// One slot as sent to / returned by the booking API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotPayload {
    #[serde(rename = "StartTime")]
    pub start_time: i64,
    #[serde(rename = "EndTime")]
    pub end_time: i64,
    #[serde(rename = "Timezone")]
    pub timezone: String,
    #[serde(rename = "RRule")]
    pub rrule: Option<String>,
    #[serde(rename = "DetachedSignature")]
    pub detached_signature: Option<String>,
    #[serde(rename = "BookingKeyPacket")]
    pub booking_key_packet: String,
    #[serde(rename = "SharedKeyPacket")]
    pub shared_key_packet: String,
}

impl SlotPayload {
    pub fn from_parts(slot: &BookingSlot, envelope: &SlotEnvelope) -> Self {
        SlotPayload {
            start_time: slot.start.timestamp(),
            end_time: slot.end.timestamp(),
            timezone: slot.timezone.name().to_string(),
            rrule: slot.rrule.clone(),
            detached_signature: Some(
                URL_SAFE_NO_PAD.encode(envelope.detached_signature.to_bytes()),
            ),
            booking_key_packet: URL_SAFE_NO_PAD.encode(&envelope.booking_key_packet),
            shared_key_packet: URL_SAFE_NO_PAD.encode(&envelope.shared_key_packet),
        }
    }

    /// Rebuild the slot and its optional signature from the wire form.
    pub fn to_slot(&self) -> Result<(BookingSlot, Option<Signature>)> {
        let timezone = self
            .timezone
            .parse()
            .map_err(|_| CryptoError::InvalidInput(format!("unknown timezone {}", self.timezone)))?;
        let slot = BookingSlot {
            start: decode_time("StartTime", self.start_time)?,
            end: decode_time("EndTime", self.end_time)?,
            timezone,
            rrule: self.rrule.clone(),
        };
        let signature = decode_signature("DetachedSignature", self.detached_signature.as_deref())?;
        Ok((slot, signature))
    }

    pub fn booking_key_packet_bytes(&self) -> Result<Vec<u8>> {
        decode_field("BookingKeyPacket", &self.booking_key_packet)
    }

    pub fn shared_key_packet_bytes(&self) -> Result<Vec<u8>> {
        decode_field("SharedKeyPacket", &self.shared_key_packet)
    }
}

/// Payload submitted to create a booking page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookingPayload {
    #[serde(rename = "BookingUID")]
    pub booking_uid: String,
    #[serde(rename = "BookingKeySalt")]
    pub booking_key_salt: String,
    #[serde(rename = "EncryptedSecret")]
    pub encrypted_secret: String,
    #[serde(rename = "SecretSignature")]
    pub secret_signature: Option<String>,
    #[serde(rename = "EncryptedContent")]
    pub encrypted_content: String,
    #[serde(rename = "ContentSignature")]
    pub content_signature: Option<String>,
    #[serde(rename = "Slots")]
    pub slots: Vec<SlotPayload>,
}

/// Payload submitted to edit an existing booking page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditBookingPayload {
    #[serde(rename = "EncryptedContent")]
    pub encrypted_content: String,
    #[serde(rename = "ContentSignature")]
    pub content_signature: Option<String>,
    #[serde(rename = "Slots")]
    pub slots: Vec<SlotPayload>,
}

/// What the server returns on the read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingReadResponse {
    #[serde(rename = "EncryptedSecret")]
    pub encrypted_secret: String,
    #[serde(rename = "SecretSignature")]
    pub secret_signature: Option<String>,
    #[serde(rename = "EncryptedContent")]
    pub encrypted_content: String,
    #[serde(rename = "ContentSignature")]
    pub content_signature: Option<String>,
    #[serde(rename = "BookingKeySalt")]
    pub booking_key_salt: String,
    #[serde(rename = "Slots")]
    pub slots: Vec<SlotPayload>,
}

impl BookingReadResponse {
    pub fn encrypted_secret_bytes(&self) -> Result<Vec<u8>> {
        decode_field("EncryptedSecret", &self.encrypted_secret)
    }

    pub fn encrypted_content_bytes(&self) -> Result<Vec<u8>> {
        decode_field("EncryptedContent", &self.encrypted_content)
    }

    pub fn secret_signature_parsed(&self) -> Result<Option<Signature>> {
        decode_signature("SecretSignature", self.secret_signature.as_deref())
    }

    pub fn content_signature_parsed(&self) -> Result<Option<Signature>> {
        decode_signature("ContentSignature", self.content_signature.as_deref())
    }

    pub fn booking_key_salt_bytes(&self) -> Result<Vec<u8>> {
        decode_field("BookingKeySalt", &self.booking_key_salt)
    }
}

pub(crate) fn encode_bytes(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub(crate) fn encode_signature(signature: &Signature) -> String {
    URL_SAFE_NO_PAD.encode(signature.to_bytes())
}

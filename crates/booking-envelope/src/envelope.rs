//! Encryption envelope -- encrypt, sign, decrypt, and verify booking
//! artifacts.
//!
//! Three artifact kinds exist, each with its own signature context so a
//! signature from one can never be replayed against another:
//!
//! - the root secret, sealed to the owner's own X25519 key
//!   (context `secret.<calendarID>`)
//! - the booking content, encrypted under the derived booking key
//!   (context `content.<uid>`)
//! - the slot batch: per slot, a fresh session key wrapped once under the
//!   booking key and once under the calendar public key, plus a detached
//!   signature over the canonical slot tuple (context `slot.<uid>`)
//!
//! Decryption failure is fatal. Signature failure is not: the plaintext is
//! still returned, with [`VerificationOutcome::failed_to_verify`] set and an
//! audit log record emitted.

use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hkdf::Hkdf;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519Public, StaticSecret};

use booking_engine::{BookingSlot, LocationType};

use crate::canonical::canonical_json;
use crate::error::{CryptoError, Result};
use crate::kdf::{BookingKey, BookingSecret, BookingUid};

/// AES-256-GCM nonce length.
const NONCE_LEN: usize = 12;
/// AES-256-GCM authentication tag length.
const TAG_LEN: usize = 16;
/// X25519 public key length (sealed packet prefix).
const X25519_PUB_LEN: usize = 32;
/// Length of a fresh per-slot session key.
pub const SESSION_KEY_LEN: usize = 32;

const CONTEXT_SECRET: &str = "secret";
const CONTEXT_CONTENT: &str = "content";
const CONTEXT_SLOT: &str = "slot";
const SEALED_KEY_INFO: &[u8] = b"bookings.sealed_key";

/// The booking metadata that gets encrypted and signed as one blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BookingContent {
    pub summary: String,
    pub description: String,
    pub location: String,
    pub location_type: LocationType,
    pub with_meeting_link: bool,
}

/// The root secret sealed to the owner's key, with its detached signature.
#[derive(Debug, Clone)]
pub struct EncryptedSecret {
    pub key_packet: Vec<u8>,
    pub signature: Signature,
}

/// Encrypted booking content with its detached signature.
#[derive(Debug, Clone)]
pub struct EncryptedContent {
    pub ciphertext: Vec<u8>,
    pub signature: Signature,
}

/// Per-slot envelope: detached signature over the canonical slot tuple plus
/// the session key wrapped under the booking key and the calendar key.
#[derive(Debug, Clone)]
pub struct SlotEnvelope {
    pub detached_signature: Signature,
    pub booking_key_packet: Vec<u8>,
    pub shared_key_packet: Vec<u8>,
}

/// Result of signature verification, attached independently to the content
/// and to the slot batch. Non-fatal: the plaintext stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerificationOutcome {
    pub failed_to_verify: bool,
}

/// The owner's private key material, as handed over by the external
/// calendar key service.
pub struct OwnerKeys {
    pub encryption: StaticSecret,
    pub signing: SigningKey,
}

impl OwnerKeys {
    pub fn generate() -> Self {
        OwnerKeys {
            encryption: StaticSecret::random_from_rng(OsRng),
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn encryption_public(&self) -> X25519Public {
        X25519Public::from(&self.encryption)
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }
}

// ── Primitives ──────────────────────────────────────────────────────────────

fn signed_payload(context: &str, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(context.len() + 1 + data.len());
    payload.extend_from_slice(context.as_bytes());
    payload.push(0);
    payload.extend_from_slice(data);
    payload
}

/// AEAD-encrypt under a 32-byte key. Output layout: `nonce || ciphertext`.
fn aead_seal(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::Encrypt("AEAD encryption".to_string()))?;
    let mut out = nonce.to_vec();
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn aead_open(key: &[u8; 32], packet: &[u8]) -> Result<Vec<u8>> {
    if packet.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Decrypt);
    }
    let (nonce, ciphertext) = packet.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decrypt)
}

fn sealed_box_key(
    shared: &[u8],
    ephemeral_public: &[u8; 32],
    recipient_public: &[u8; 32],
) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, shared);
    // Bind both public keys so the derived key is specific to this exchange.
    let mut info = Vec::with_capacity(SEALED_KEY_INFO.len() + 64);
    info.extend_from_slice(SEALED_KEY_INFO);
    info.extend_from_slice(ephemeral_public);
    info.extend_from_slice(recipient_public);
    let mut okm = [0u8; 32];
    hk.expand(&info, &mut okm)
        .map_err(|_| CryptoError::Encrypt("HKDF output length".to_string()))?;
    Ok(okm)
}

/// Seal `plaintext` to an X25519 public key (ephemeral DH + HKDF + AEAD).
/// Output layout: `ephemeral_public || nonce || ciphertext`.
fn seal_to_public(recipient: &X25519Public, plaintext: &[u8]) -> Result<Vec<u8>> {
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519Public::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(recipient);
    let key = sealed_box_key(
        shared.as_bytes(),
        ephemeral_public.as_bytes(),
        recipient.as_bytes(),
    )?;
    let mut out = ephemeral_public.as_bytes().to_vec();
    out.extend_from_slice(&aead_seal(&key, plaintext)?);
    Ok(out)
}

fn open_sealed(recipient: &StaticSecret, packet: &[u8]) -> Result<Vec<u8>> {
    if packet.len() < X25519_PUB_LEN + NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Decrypt);
    }
    let ephemeral_bytes: [u8; 32] = packet[..X25519_PUB_LEN]
        .try_into()
        .map_err(|_| CryptoError::Decrypt)?;
    let ephemeral_public = X25519Public::from(ephemeral_bytes);
    let shared = recipient.diffie_hellman(&ephemeral_public);
    let key = sealed_box_key(
        shared.as_bytes(),
        ephemeral_public.as_bytes(),
        X25519Public::from(recipient).as_bytes(),
    )?;
    aead_open(&key, &packet[X25519_PUB_LEN..])
}

/// Verify a detached signature, reporting the outcome without failing.
///
/// Skipped entirely (outcome ok) when no verification keys are configured.
/// A missing signature and a mismatching one are treated identically: both
/// set `failed_to_verify` and emit an audit record.
fn verify_detached(
    verify_keys: &[VerifyingKey],
    context: &str,
    data: &[u8],
    signature: Option<&Signature>,
) -> VerificationOutcome {
    if verify_keys.is_empty() {
        return VerificationOutcome::default();
    }
    let Some(signature) = signature else {
        tracing::warn!(context, "booking artifact has no signature");
        return VerificationOutcome {
            failed_to_verify: true,
        };
    };
    let payload = signed_payload(context, data);
    let verified = verify_keys
        .iter()
        .any(|key| key.verify(&payload, signature).is_ok());
    if !verified {
        tracing::warn!(context, "booking artifact signature did not verify");
    }
    VerificationOutcome {
        failed_to_verify: !verified,
    }
}

// ── Secret ──────────────────────────────────────────────────────────────────

/// Seal the root secret to the owner's own key and sign it.
///
/// The owner recovers the secret from the server later without re-deriving
/// it from the link. Signature context: `secret.<calendar_id>`.
pub fn encrypt_secret(
    secret: &BookingSecret,
    owner_public: &X25519Public,
    signing: &SigningKey,
    calendar_id: &str,
) -> Result<EncryptedSecret> {
    let key_packet = seal_to_public(owner_public, secret.as_bytes())?;
    let context = format!("{CONTEXT_SECRET}.{calendar_id}");
    let signature = signing.sign(&signed_payload(&context, secret.as_bytes()));
    Ok(EncryptedSecret {
        key_packet,
        signature,
    })
}

/// Recover and verify the root secret.
///
/// Decryption failure is fatal; signature failure only marks the outcome.
pub fn decrypt_and_verify_secret(
    key_packet: &[u8],
    signature: Option<&Signature>,
    owner_encryption: &StaticSecret,
    verify_keys: &[VerifyingKey],
    calendar_id: &str,
) -> Result<(BookingSecret, VerificationOutcome)> {
    let plaintext = open_sealed(owner_encryption, key_packet)?;
    let secret = BookingSecret::from_bytes(&plaintext)?;
    let context = format!("{CONTEXT_SECRET}.{calendar_id}");
    let outcome = verify_detached(verify_keys, &context, secret.as_bytes(), signature);
    Ok((secret, outcome))
}

// ── Content ─────────────────────────────────────────────────────────────────

fn content_canonical_bytes(content: &BookingContent) -> Result<Vec<u8>> {
    canonical_json(&serde_json::to_value(content)?)
}

/// Encrypt and sign the booking content as one canonical-JSON blob.
///
/// Signature context: `content.<uid>`.
pub fn encrypt_content(
    content: &BookingContent,
    key: &BookingKey,
    signing: &SigningKey,
    uid: &BookingUid,
) -> Result<EncryptedContent> {
    let plaintext = content_canonical_bytes(content)?;
    let ciphertext = aead_seal(key.as_bytes(), &plaintext)?;
    let context = format!("{CONTEXT_CONTENT}.{uid}");
    let signature = signing.sign(&signed_payload(&context, &plaintext));
    Ok(EncryptedContent {
        ciphertext,
        signature,
    })
}

/// Decrypt and verify booking content.
pub fn decrypt_and_verify_content(
    ciphertext: &[u8],
    signature: Option<&Signature>,
    key: &BookingKey,
    verify_keys: &[VerifyingKey],
    uid: &BookingUid,
) -> Result<(BookingContent, VerificationOutcome)> {
    let plaintext = aead_open(key.as_bytes(), ciphertext)?;
    let content: BookingContent = serde_json::from_slice(&plaintext)?;
    let context = format!("{CONTEXT_CONTENT}.{uid}");
    let outcome = verify_detached(verify_keys, &context, &plaintext, signature);
    Ok((content, outcome))
}

// ── Slots ───────────────────────────────────────────────────────────────────

/// Canonical signed bytes for one slot: the `{EndTime, RRule, StartTime,
/// Timezone}` tuple with keys in fixed alphabetical order, times as Unix
/// seconds.
pub fn slot_signing_bytes(slot: &BookingSlot) -> Result<Vec<u8>> {
    canonical_json(&serde_json::json!({
        "EndTime": slot.end.timestamp(),
        "RRule": slot.rrule,
        "StartTime": slot.start.timestamp(),
        "Timezone": slot.timezone.name(),
    }))
}

/// Encrypt and sign a single slot.
///
/// A fresh random session key is wrapped twice: under the booking key (the
/// owner reads slot timing without the calendar service) and under the
/// calendar public key (the calendar service reads it without the booking
/// password). Signature context: `slot.<uid>`.
pub fn encrypt_slot(
    slot: &BookingSlot,
    key: &BookingKey,
    calendar_public: &X25519Public,
    signing: &SigningKey,
    uid: &BookingUid,
) -> Result<SlotEnvelope> {
    let mut session_key = [0u8; SESSION_KEY_LEN];
    OsRng.fill_bytes(&mut session_key);

    let booking_key_packet = aead_seal(key.as_bytes(), &session_key)?;
    let shared_key_packet = seal_to_public(calendar_public, &session_key)?;

    let context = format!("{CONTEXT_SLOT}.{uid}");
    let detached_signature = signing.sign(&signed_payload(&context, &slot_signing_bytes(slot)?));

    Ok(SlotEnvelope {
        detached_signature,
        booking_key_packet,
        shared_key_packet,
    })
}

/// Encrypt and sign every slot, all-or-nothing.
///
/// Each slot is independent; envelope `i` always corresponds to `slots[i]`,
/// so callers fanning the work out concurrently must join results by index,
/// never by completion order. The first failure discards all completed
/// envelopes.
pub fn encrypt_slots(
    slots: &[BookingSlot],
    key: &BookingKey,
    calendar_public: &X25519Public,
    signing: &SigningKey,
    uid: &BookingUid,
) -> Result<Vec<SlotEnvelope>> {
    slots
        .iter()
        .map(|slot| encrypt_slot(slot, key, calendar_public, signing, uid))
        .collect()
}

/// Verify the detached signatures of a slot batch.
///
/// One outcome for the whole batch: any missing or mismatching signature
/// marks it failed. Never fails the read.
pub fn verify_slot_signatures(
    slots: &[(BookingSlot, Option<Signature>)],
    verify_keys: &[VerifyingKey],
    uid: &BookingUid,
) -> Result<VerificationOutcome> {
    let context = format!("{CONTEXT_SLOT}.{uid}");
    let mut outcome = VerificationOutcome::default();
    for (slot, signature) in slots {
        let bytes = slot_signing_bytes(slot)?;
        let slot_outcome = verify_detached(verify_keys, &context, &bytes, signature.as_ref());
        outcome.failed_to_verify |= slot_outcome.failed_to_verify;
    }
    Ok(outcome)
}

/// Unwrap a slot's session key with the derived booking key (owner path).
pub fn unwrap_session_key(packet: &[u8], key: &BookingKey) -> Result<[u8; SESSION_KEY_LEN]> {
    let plaintext = aead_open(key.as_bytes(), packet)?;
    plaintext.as_slice().try_into().map_err(|_| CryptoError::Decrypt)
}

/// Unwrap a slot's session key with the calendar's X25519 secret
/// (calendar-service path).
pub fn unwrap_shared_session_key(
    packet: &[u8],
    calendar_secret: &StaticSecret,
) -> Result<[u8; SESSION_KEY_LEN]> {
    let plaintext = open_sealed(calendar_secret, packet)?;
    plaintext.as_slice().try_into().map_err(|_| CryptoError::Decrypt)
}

//! Tests for key and uid derivation.

use booking_envelope::kdf::{
    derive_booking_key, derive_booking_uid, BookingKeySalt, BookingSecret, SALT_LEN, SECRET_LEN,
};

fn secret_of(byte: u8) -> BookingSecret {
    BookingSecret::from_bytes(&[byte; SECRET_LEN]).unwrap()
}

fn salt_of(byte: u8) -> BookingKeySalt {
    BookingKeySalt::from_bytes(&[byte; SALT_LEN]).unwrap()
}

#[test]
fn uid_is_deterministic() {
    let secret = secret_of(7);

    let a = derive_booking_uid(&secret).unwrap();
    let b = derive_booking_uid(&secret).unwrap();

    assert_eq!(a, b);
}

#[test]
fn uid_is_calendar_independent() {
    // The uid depends on the secret alone; no calendar id enters derivation.
    let a = derive_booking_uid(&secret_of(7)).unwrap();
    let b = derive_booking_uid(&secret_of(8)).unwrap();

    assert_ne!(a, b);
}

#[test]
fn key_is_deterministic_for_identical_inputs() {
    let a = derive_booking_key(&secret_of(7), &salt_of(1), "cal-1").unwrap();
    let b = derive_booking_key(&secret_of(7), &salt_of(1), "cal-1").unwrap();

    assert_eq!(a, b);
}

#[test]
fn key_differs_per_calendar() {
    let a = derive_booking_key(&secret_of(7), &salt_of(1), "cal-1").unwrap();
    let b = derive_booking_key(&secret_of(7), &salt_of(1), "cal-2").unwrap();

    assert_ne!(a, b);
}

#[test]
fn key_differs_per_salt() {
    let a = derive_booking_key(&secret_of(7), &salt_of(1), "cal-1").unwrap();
    let b = derive_booking_key(&secret_of(7), &salt_of(2), "cal-1").unwrap();

    assert_ne!(a, b);
}

#[test]
fn key_differs_from_uid() {
    let secret = secret_of(7);

    let key = derive_booking_key(&secret, &salt_of(1), "cal-1").unwrap();
    let uid = derive_booking_uid(&secret).unwrap();

    assert_ne!(key.as_bytes(), uid.as_bytes());
}

#[test]
fn wrong_secret_length_is_rejected() {
    assert!(BookingSecret::from_bytes(&[0u8; 16]).is_err());
    assert!(BookingSecret::from_bytes(&[0u8; 33]).is_err());
}

#[test]
fn wrong_salt_length_is_rejected() {
    assert!(BookingKeySalt::from_bytes(&[0u8; 16]).is_err());
}

#[test]
fn empty_calendar_id_is_rejected() {
    assert!(derive_booking_key(&secret_of(7), &salt_of(1), "").is_err());
}

#[test]
fn secret_debug_is_redacted() {
    let secret = secret_of(0xAB);

    let rendered = format!("{secret:?}");

    assert!(!rendered.contains("171"));
    assert!(!rendered.to_lowercase().contains("ab"));
    assert_eq!(rendered, "BookingSecret(..)");
}

#[test]
fn generated_secrets_differ() {
    assert_ne!(BookingSecret::generate(), BookingSecret::generate());
}

//! Public booking link -- the secret travels only in the URL fragment.
//!
//! Fragments are never sent to the server by browsers, so the link can be
//! shared while the server only ever sees the encrypted secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::{CryptoError, Result};
use crate::kdf::BookingSecret;

/// Path component of every booking link.
pub const LINK_PATH: &str = "/bookings";

/// Build the shareable link: `https://<host>/bookings#<base64url(secret)>`.
pub fn format_booking_link(host: &str, secret: &BookingSecret) -> String {
    format!(
        "https://{host}{LINK_PATH}#{}",
        URL_SAFE_NO_PAD.encode(secret.as_bytes())
    )
}

/// Extract the booking secret from a link.
///
/// # Errors
/// `CryptoError::InvalidLink` when the fragment is missing or not valid
/// base64url; `CryptoError::InvalidInput` when the decoded secret has the
/// wrong length.
pub fn parse_booking_link(url: &str) -> Result<BookingSecret> {
    let (_, fragment) = url
        .split_once('#')
        .ok_or_else(|| CryptoError::InvalidLink("missing fragment".to_string()))?;
    if fragment.is_empty() {
        return Err(CryptoError::InvalidLink("empty fragment".to_string()));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(fragment)
        .map_err(|_| CryptoError::InvalidLink("fragment is not base64url".to_string()))?;
    BookingSecret::from_bytes(&bytes)
}

//! Error types for booking-envelope operations.
//!
//! Decryption failures are fatal: the artifact is unusable and the error
//! propagates. Signature-verification failures are NOT errors -- they are
//! reported through [`crate::envelope::VerificationOutcome`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key material or input of the wrong shape (bad lengths, empty ids).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The public booking link could not be parsed.
    #[error("Invalid booking link: {0}")]
    InvalidLink(String),

    /// An encryption or signing primitive failed.
    #[error("Encryption failed: {0}")]
    Encrypt(String),

    /// Wrong key or corrupt ciphertext. The artifact cannot be used.
    #[error("Decryption failed")]
    Decrypt,

    /// The slot or range ceiling was hit before encryption.
    #[error("Limit exceeded: at most {limit} {what} per booking page")]
    LimitExceeded { what: &'static str, limit: usize },

    /// A blocking validation finding refused the submission.
    #[error("Submission blocked: {0}")]
    Blocked(String),

    #[error(transparent)]
    Engine(#[from] booking_engine::EngineError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

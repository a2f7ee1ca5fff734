//! Error types for booking-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unrepresentable local time: {0}")]
    InvalidLocalTime(String),

    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

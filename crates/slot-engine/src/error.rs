//! Error types for slot-engine operations.
//!
//! Every variant is a caller-input problem detected before any calendar data is
//! fetched. Unreadable event timestamps are not errors; see
//! [`ParseWarning`](crate::event::ParseWarning).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}': expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid duration: {0} minutes (must be greater than 0)")]
    InvalidDuration(i64),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

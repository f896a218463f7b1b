//! Error types for the Garoon client.
//!
//! Three classes are kept apart: configuration problems at startup,
//! [`ValidationError`]s raised before any request is sent, and
//! [`FetchError`]s from the calendar source itself.

use slot_engine::ValidationError;
use thiserror::Error;

/// The calendar source failed or answered with something unusable.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Garoon API request failed: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Garoon request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected Garoon response: {0}")]
    Decode(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),
}

#[derive(Error, Debug)]
pub enum GaroonError {
    #[error("Missing required environment variable: {key}")]
    MissingEnv { key: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl GaroonError {
    /// Stable label for logs and tool error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            GaroonError::MissingEnv { .. } | GaroonError::InvalidConfig(_) => "config",
            GaroonError::Validation(_) => "validation",
            GaroonError::Fetch(_) => "source_fetch",
        }
    }
}

impl From<reqwest::Error> for GaroonError {
    fn from(err: reqwest::Error) -> Self {
        GaroonError::Fetch(FetchError::Transport(err))
    }
}

pub type Result<T> = std::result::Result<T, GaroonError>;

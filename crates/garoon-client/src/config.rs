//! Runtime configuration for the Garoon client.
//!
//! Priority: process environment > `.env` file > defaults.

use std::env;
use std::time::Duration;

use chrono_tz::Tz;
use slot_engine::parse_timezone;
use url::Url;

use crate::error::{GaroonError, Result};

pub const ENV_BASE_URL: &str = "GAROON_BASE_URL";
pub const ENV_USERNAME: &str = "GAROON_USERNAME";
pub const ENV_PASSWORD: &str = "GAROON_PASSWORD";
pub const ENV_TIMEZONE: &str = "GAROON_TIMEZONE";
pub const ENV_TIMEOUT_SECS: &str = "GAROON_TIMEOUT_SECS";

const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct GaroonConfig {
    /// Garoon base URL, e.g. `https://example.cybozu.com`.
    pub base_url: Url,
    pub username: String,
    pub password: String,
    /// Zone used to build request ranges and to bucket events into days.
    pub timezone: Tz,
    pub timeout: Duration,
}

// Hand-written so the password never reaches a log line.
impl std::fmt::Debug for GaroonConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaroonConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timezone", &self.timezone)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GaroonConfig {
    /// Build a config with the default timezone (UTC) and timeout.
    ///
    /// # Errors
    /// Returns `GaroonError::InvalidConfig` if `base_url` is not a valid URL.
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            username: username.to_string(),
            password: password.to_string(),
            timezone: chrono_tz::UTC,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Replace the timezone by IANA name.
    ///
    /// # Errors
    /// Returns `GaroonError::Validation` for an unknown zone name.
    pub fn with_timezone(mut self, name: &str) -> Result<Self> {
        self.timezone = parse_timezone(name)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. [`from_env`](Self::from_env) passes
    /// `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(GaroonError::MissingEnv { key })
        };

        let base_url = required(ENV_BASE_URL)?;
        let username = required(ENV_USERNAME)?;
        let password = required(ENV_PASSWORD)?;

        let timezone = lookup(ENV_TIMEZONE).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        let timeout_secs = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                GaroonError::InvalidConfig(format!("{ENV_TIMEOUT_SECS} must be an integer, got '{raw}'"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self::new(&base_url, &username, &password)?
            .with_timezone(&timezone)?
            .with_timeout(Duration::from_secs(timeout_secs)))
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| GaroonError::InvalidConfig(format!("invalid base URL '{raw}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(GaroonError::InvalidConfig(format!(
            "base URL '{raw}' cannot carry a path"
        )));
    }
    Ok(url)
}

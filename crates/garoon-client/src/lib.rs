//! # garoon-client
//!
//! Garoon REST API client and the two-party meeting time search built on it.
//!
//! ## Modules
//!
//! - [`config`]: Environment/`.env` configuration
//! - [`client`]: [`GaroonClient`]: schedule, user and event-creation endpoints
//! - [`source`]: [`CalendarSource`], the seam the search consumes
//! - [`scheduler`]: [`find_available_time`]: validate, fetch both calendars, find slots
//! - [`error`]: Error types

pub mod client;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod source;

pub use client::{GaroonClient, NewEvent, DEFAULT_USER_SEARCH_LIMIT};
pub use config::GaroonConfig;
pub use error::{FetchError, GaroonError};
pub use scheduler::{find_available_time, FindAvailableTimeRequest};
pub use slot_engine::Slot;
pub use source::CalendarSource;

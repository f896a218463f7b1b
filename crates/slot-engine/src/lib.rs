//! # slot-engine
//!
//! Deterministic meeting slot search across two calendars.
//!
//! Given both parties' events, a date range, a daily business window and a
//! lunch policy, the engine proposes up to three slots of a requested duration.
//! It is a pure, synchronous computation over already-fetched data: no I/O, no
//! clock access, no logging. Events that cannot be read are reported back as
//! [`ParseWarning`]s for the caller to log.
//!
//! ## Modules
//!
//! - [`event`]: Raw source records → absolute [`Event`] instants
//! - [`config`]: Date range, business hours, validated [`SearchConfig`]
//! - [`finder`]: The per-day sweep producing [`Slot`]s
//! - [`dst`]: Wall-clock resolution across DST transitions
//! - [`error`]: Validation errors

pub mod config;
pub mod dst;
pub mod error;
pub mod event;
pub mod finder;

pub use config::{parse_timezone, BusinessHours, DateRange, SearchConfig, MAX_SLOTS};
pub use error::ValidationError;
pub use event::{
    normalize_events, parse_timestamp, parse_timestamp_in, Event, Normalized, ParseWarning, RawEvent,
};
pub use finder::{available_slots, find_available_slots, Slot};

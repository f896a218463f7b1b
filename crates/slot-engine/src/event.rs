//! Source event records and timestamp normalization.
//!
//! Calendar sources hand us loosely-shaped records whose `start.dateTime` and
//! `end.dateTime` strings may use `Z`, `+HH:MM` or `+HHMM` offsets. Everything
//! is normalized to absolute UTC instants here, before any interval arithmetic.
//! Records that cannot be normalized are dropped and reported as
//! [`ParseWarning`]s rather than failing the whole search.
//!
//! Only `start` and `end` decide whether a record survives: an `id` or
//! `subject` of an unexpected shape reads as absent.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::dst::localize;

/// Offset-bearing layouts tried after RFC 3339, in order.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

/// Offset-less layouts; matching one of these means the offset is missing.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// A `start`/`end` object as returned by the calendar source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTime {
    #[serde(
        rename = "dateTime",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_time: Option<String>,
    #[serde(
        rename = "timeZone",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn new(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            time_zone: None,
        }
    }
}

/// Event subject; Garoon nests it as `{"value": ...}`, other sources send a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Text(String),
    Value { value: String },
}

impl Subject {
    pub fn as_str(&self) -> &str {
        match self {
            Subject::Text(s) => s,
            Subject::Value { value } => value,
        }
    }
}

/// An event record as fetched, before normalization. Unknown fields are ignored
/// and known fields of the wrong shape read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Known(T),
    Other(IgnoredAny),
}

/// Deserialize `T`, or `None` for any value that is not a `T` (including null).
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Known(value) => Some(value),
        Lenient::Other(_) => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

/// Ids arrive as strings from Garoon and as numbers from some other sources.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, RecordId>(deserializer)?.map(|id| match id {
        RecordId::Text(s) => s,
        RecordId::Signed(n) => n.to_string(),
        RecordId::Unsigned(n) => n.to_string(),
    }))
}

impl RawEvent {
    /// Build a record with just the two timestamps set.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            id: None,
            subject: None,
            start: Some(EventTime::new(start)),
            end: Some(EventTime::new(end)),
        }
    }

    fn start_str(&self) -> Option<&str> {
        self.start.as_ref().and_then(|t| t.date_time.as_deref())
    }

    fn end_str(&self) -> Option<&str> {
        self.end.as_ref().and_then(|t| t.date_time.as_deref())
    }
}

/// A busy period as two absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Why a timestamp string was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,

    #[error("timestamp '{0}' has no UTC offset")]
    MissingOffset(String),

    #[error("unrecognized timestamp '{0}'")]
    Unrecognized(String),
}

/// Which side of an event failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventField {
    Start,
    End,
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventField::Start => f.write_str("start"),
            EventField::End => f.write_str("end"),
        }
    }
}

/// A dropped event, reported back to the caller instead of logged here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub event_id: Option<String>,
    pub field: EventField,
    pub value: Option<String>,
    pub reason: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event {}: {} dateTime {}",
            self.event_id.as_deref().unwrap_or("<no id>"),
            self.field,
            self.reason
        )
    }
}

/// Result of [`normalize_events`]: the usable events plus what was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub events: Vec<Event>,
    pub warnings: Vec<ParseWarning>,
}

/// Parse an offset-bearing ISO 8601 timestamp into an absolute instant.
///
/// Accepts RFC 3339 (`2025-01-15T10:00:00Z`, `2025-01-15T10:00:00+09:00`),
/// compact offsets (`+0900`) and minute precision (`2025-01-15T10:00+09:00`).
/// Timestamps without an offset are rejected with
/// [`TimestampError::MissingOffset`]: they do not name an instant.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Zero-offset shorthand outside strict RFC 3339 (e.g. "2025-01-15T10:00Z").
    let expanded = match trimmed.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => trimmed.to_string(),
    };

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&expanded, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    if NAIVE_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).is_ok())
    {
        return Err(TimestampError::MissingOffset(trimmed.to_string()));
    }

    Err(TimestampError::Unrecognized(trimmed.to_string()))
}

/// Like [`parse_timestamp`], but a timestamp without an offset is read as
/// wall-clock time in `tz` (resolved with [`localize`]).
pub fn parse_timestamp_in(value: &str, tz: Tz) -> Result<DateTime<Utc>, TimestampError> {
    match parse_timestamp(value) {
        Err(TimestampError::MissingOffset(naive)) => NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&naive, fmt).ok())
            .map(|local| localize(&tz, local).with_timezone(&Utc))
            .ok_or(TimestampError::Unrecognized(naive)),
        other => other,
    }
}

/// Normalize raw records into absolute [`Event`]s, preserving input order.
///
/// Offset-less timestamps are read in `tz`. A record whose `start` or `end`
/// is missing or unparsable is dropped and a [`ParseWarning`] is recorded
/// for it.
pub fn normalize_events(raw: &[RawEvent], tz: Tz) -> Normalized {
    let mut normalized = Normalized::default();

    for record in raw {
        let start = parse_field(record, EventField::Start, record.start_str(), tz);
        let end = parse_field(record, EventField::End, record.end_str(), tz);

        match (start, end) {
            (Ok(start), Ok(end)) => normalized.events.push(Event { start, end }),
            (Err(warning), _) | (_, Err(warning)) => normalized.warnings.push(warning),
        }
    }

    normalized
}

fn parse_field(
    record: &RawEvent,
    field: EventField,
    value: Option<&str>,
    tz: Tz,
) -> Result<DateTime<Utc>, ParseWarning> {
    let warning = |reason: String| ParseWarning {
        event_id: record.id.clone(),
        field,
        value: value.map(str::to_string),
        reason,
    };

    match value {
        None => Err(warning("is missing".to_string())),
        Some(s) => parse_timestamp_in(s, tz).map_err(|e| warning(e.to_string())),
    }
}

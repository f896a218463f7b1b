//! Two-party meeting time search over a [`CalendarSource`].
//!
//! Validates the request, fetches both calendars concurrently, logs any
//! dropped events, and hands the merged data to
//! [`slot_engine::find_available_slots`].

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slot_engine::config::{DEFAULT_DAILY_END, DEFAULT_DAILY_START};
use slot_engine::{find_available_slots, normalize_events, ParseWarning, SearchConfig, Slot};
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::source::CalendarSource;

fn default_start_time() -> String {
    DEFAULT_DAILY_START.to_string()
}

fn default_end_time() -> String {
    DEFAULT_DAILY_END.to_string()
}

fn default_true() -> bool {
    true
}

/// Arguments of the `find_available_time` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindAvailableTimeRequest {
    /// The counterpart's Garoon user id.
    pub user_id: String,
    /// `YYYY-MM-DD`, inclusive.
    pub start_date: String,
    /// `YYYY-MM-DD`, inclusive.
    pub end_date: String,
    pub duration_minutes: i64,
    /// `HH:MM`, default `09:00`.
    #[serde(default = "default_start_time")]
    pub start_time: String,
    /// `HH:MM`, default `18:00`.
    #[serde(default = "default_end_time")]
    pub end_time: String,
    /// Block 12:00-13:00, default `true`.
    #[serde(default = "default_true")]
    pub exclude_lunch: bool,
}

impl FindAvailableTimeRequest {
    /// A request with the default business hours and lunch exclusion.
    pub fn new(user_id: &str, start_date: &str, end_date: &str, duration_minutes: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            duration_minutes,
            start_time: default_start_time(),
            end_time: default_end_time(),
            exclude_lunch: true,
        }
    }

    pub fn search_config(&self, timezone: Tz) -> Result<SearchConfig> {
        Ok(SearchConfig::from_strings(
            &self.start_date,
            &self.end_date,
            self.duration_minutes,
            &self.start_time,
            &self.end_time,
            self.exclude_lunch,
            timezone,
        )?)
    }
}

/// Find up to three slots free for both the caller and `request.user_id`.
///
/// Everything is validated before either calendar is fetched. The two
/// fetches run concurrently; if either fails the search fails with
/// `GaroonError::Fetch` and no partial result.
#[instrument(skip(source, request), fields(user_id = %request.user_id, start = %request.start_date, end = %request.end_date))]
pub async fn find_available_time<S>(
    source: &S,
    timezone: Tz,
    request: &FindAvailableTimeRequest,
) -> Result<Vec<Slot>>
where
    S: CalendarSource + ?Sized,
{
    let config = request.search_config(timezone)?;
    let (start, end) = (config.date_range.start, config.date_range.end);

    let (mine, theirs) = tokio::try_join!(
        source.fetch_events(start, end, None),
        source.fetch_events(start, end, Some(request.user_id.as_str())),
    )?;

    let mine = normalize_events(&mine, timezone);
    let theirs = normalize_events(&theirs, timezone);
    log_warnings(&mine.warnings);
    log_warnings(&theirs.warnings);

    let slots = find_available_slots(&mine.events, &theirs.events, &config);
    info!(
        busy = mine.events.len() + theirs.events.len(),
        slots = slots.len(),
        "meeting time search finished"
    );
    Ok(slots)
}

fn log_warnings(warnings: &[ParseWarning]) {
    for warning in warnings {
        warn!(
            event_id = warning.event_id.as_deref().unwrap_or(""),
            field = %warning.field,
            "dropping event: {warning}"
        );
    }
}

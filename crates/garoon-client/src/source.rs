//! The calendar data seam consumed by the meeting-time search.

use async_trait::async_trait;
use chrono::NaiveDate;
use slot_engine::RawEvent;

use crate::error::FetchError;

/// Read-only access to calendar events.
///
/// `user_id = None` means the authenticated user's own calendar.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch_events(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        user_id: Option<&str>,
    ) -> Result<Vec<RawEvent>, FetchError>;
}

//! Tests for the meeting time search over an in-memory calendar source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use garoon_client::{find_available_time, CalendarSource, FetchError, FindAvailableTimeRequest};
use slot_engine::RawEvent;

const TOKYO: chrono_tz::Tz = chrono_tz::Asia::Tokyo;

/// Serves fixed events per user; `None` is the caller. Optionally fails or
/// delays one user's fetch.
#[derive(Default)]
struct FakeSource {
    events: HashMap<Option<String>, Vec<RawEvent>>,
    fail_for: Option<Option<String>>,
    delay_for: Option<Option<String>>,
    calls: AtomicUsize,
}

impl FakeSource {
    fn with(mut self, user: Option<&str>, events: Vec<RawEvent>) -> Self {
        self.events.insert(user.map(str::to_string), events);
        self
    }
}

#[async_trait]
impl CalendarSource for FakeSource {
    async fn fetch_events(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
        user_id: Option<&str>,
    ) -> Result<Vec<RawEvent>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = user_id.map(str::to_string);
        if self.delay_for.as_ref() == Some(&key) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        if self.fail_for.as_ref() == Some(&key) {
            return Err(FetchError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.events.get(&key).cloned().unwrap_or_default())
    }
}

fn starts(slots: &[garoon_client::Slot]) -> Vec<String> {
    slots.iter().map(|s| s.start.to_rfc3339()).collect()
}

#[tokio::test]
async fn merges_caller_and_counterpart() {
    let source = FakeSource::default()
        .with(
            None,
            vec![RawEvent::new("2025-01-15T10:00:00+09:00", "2025-01-15T11:00:00+09:00")],
        )
        .with(
            Some("bob"),
            vec![RawEvent::new("2025-01-15T09:00:00+09:00", "2025-01-15T10:00:00+09:00")],
        );

    let request = FindAvailableTimeRequest::new("bob", "2025-01-15", "2025-01-15", 60);
    let slots = find_available_time(&source, TOKYO, &request).await.unwrap();

    assert_eq!(
        starts(&slots),
        vec!["2025-01-15T11:00:00+09:00", "2025-01-15T13:00:00+09:00"]
    );
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn completion_order_does_not_change_result() {
    let mine = vec![RawEvent::new("2025-01-15T09:00:00+09:00", "2025-01-15T09:30:00+09:00")];
    let theirs = vec![RawEvent::new("2025-01-15T13:00:00+09:00", "2025-01-15T14:00:00+09:00")];
    let request = FindAvailableTimeRequest::new("bob", "2025-01-15", "2025-01-16", 30);

    let mut slow_mine = FakeSource::default()
        .with(None, mine.clone())
        .with(Some("bob"), theirs.clone());
    slow_mine.delay_for = Some(None);

    let mut slow_theirs = FakeSource::default()
        .with(None, mine)
        .with(Some("bob"), theirs);
    slow_theirs.delay_for = Some(Some("bob".to_string()));

    assert_eq!(
        find_available_time(&slow_mine, TOKYO, &request).await.unwrap(),
        find_available_time(&slow_theirs, TOKYO, &request).await.unwrap()
    );
}

#[tokio::test]
async fn failed_counterpart_fetch_aborts_search() {
    let mut source = FakeSource::default().with(None, Vec::new());
    source.fail_for = Some(Some("bob".to_string()));

    let request = FindAvailableTimeRequest::new("bob", "2025-01-15", "2025-01-15", 60);
    let err = find_available_time(&source, TOKYO, &request).await.unwrap_err();

    assert_eq!(err.kind(), "source_fetch");
}

#[tokio::test]
async fn validation_happens_before_any_fetch() {
    let source = FakeSource::default();

    let bad_date = FindAvailableTimeRequest::new("bob", "15/01/2025", "2025-01-15", 60);
    let zero = FindAvailableTimeRequest::new("bob", "2025-01-15", "2025-01-15", 0);
    let mut bad_time = FindAvailableTimeRequest::new("bob", "2025-01-15", "2025-01-15", 60);
    bad_time.end_time = "25:00".to_string();

    for request in [bad_date, zero, bad_time] {
        let err = find_available_time(&source, TOKYO, &request).await.unwrap_err();
        assert_eq!(err.kind(), "validation", "request {request:?}");
    }
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreadable_events_are_dropped_not_fatal() {
    let source = FakeSource::default().with(
        None,
        vec![
            RawEvent::new("not a time", "2025-01-15T10:00:00+09:00"),
            RawEvent::default(),
        ],
    );

    let request = FindAvailableTimeRequest::new("bob", "2025-01-15", "2025-01-15", 60);
    let slots = find_available_time(&source, TOKYO, &request).await.unwrap();

    assert_eq!(slots[0].start.to_rfc3339(), "2025-01-15T09:00:00+09:00");
}

#[test]
fn request_defaults_apply_when_fields_omitted() {
    let request: FindAvailableTimeRequest = serde_json::from_value(serde_json::json!({
        "user_id": "bob",
        "start_date": "2025-01-15",
        "end_date": "2025-01-17",
        "duration_minutes": 30,
    }))
    .unwrap();

    assert_eq!(request.start_time, "09:00");
    assert_eq!(request.end_time, "18:00");
    assert!(request.exclude_lunch);
    assert_eq!(
        request,
        FindAvailableTimeRequest::new("bob", "2025-01-15", "2025-01-17", 30)
    );
}

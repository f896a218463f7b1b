//! Integration tests for the Garoon REST client against a mock server.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use garoon_client::{
    FetchError, FindAvailableTimeRequest, GaroonClient, GaroonConfig, GaroonError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn client_for(server: &MockServer, timezone: &str) -> GaroonClient {
    let config = GaroonConfig::new(&server.uri(), "alice", "s3cret")
        .unwrap()
        .with_timezone(timezone)
        .unwrap();
    GaroonClient::new(config).unwrap()
}

fn token() -> String {
    BASE64_STANDARD.encode("alice:s3cret")
}

fn garoon_event(id: &str, start: &str, end: &str) -> serde_json::Value {
    json!({
        "id": id,
        "subject": { "value": format!("event {id}") },
        "start": { "dateTime": start, "timeZone": "Asia/Tokyo" },
        "end": { "dateTime": end, "timeZone": "Asia/Tokyo" },
    })
}

// ── Authentication ──────────────────────────────────────────────────────────

#[tokio::test]
async fn authenticate_sends_cybozu_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .and(header("X-Cybozu-Authorization", token().as_str()))
        .and(header("User-Agent", "GaroonMCPServer/1.0"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server, "UTC").authenticate().await.unwrap();
}

#[tokio::test]
async fn authenticate_rejection_is_an_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .respond_with(ResponseTemplate::new(401).set_body_string("CB_WA01 bad login"))
        .mount(&server)
        .await;

    let err = client_for(&server, "UTC").authenticate().await.unwrap_err();
    match err {
        GaroonError::Fetch(FetchError::Authentication(message)) => {
            assert!(message.contains("401"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ── Schedule ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_schedule_uses_configured_timezone_for_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .and(query_param("rangeStart", "2025-11-29T00:00:00+09:00"))
        .and(query_param("rangeEnd", "2025-11-29T23:59:59+09:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [garoon_event("1", "2025-11-29T09:00:00+09:00", "2025-11-29T10:00:00+09:00")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let events = client_for(&server, "Asia/Tokyo")
        .get_schedule("2025-11-29", "2025-11-29", None)
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["subject"]["value"], "event 1");
}

#[tokio::test]
async fn get_schedule_in_utc_uses_zero_offset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .and(query_param("rangeStart", "2025-11-29T00:00:00+00:00"))
        .and(query_param("rangeEnd", "2025-11-30T23:59:59+00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let events = client_for(&server, "UTC")
        .get_schedule("2025-11-29", "2025-11-30", None)
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn get_schedule_for_other_user_sets_target_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .and(query_param("target", "123"))
        .and(query_param("targetType", "user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": [] })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server, "UTC")
        .get_schedule("2025-11-29", "2025-11-29", Some("123"))
        .await
        .unwrap();
}

#[tokio::test]
async fn get_schedule_rejects_bad_date_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server, "UTC")
        .get_schedule("2025-13-01", "2025-11-29", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn server_error_is_a_source_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client_for(&server, "UTC")
        .get_schedule("2025-11-29", "2025-11-29", None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "source_fetch");
    assert!(matches!(
        err,
        GaroonError::Fetch(FetchError::Status { status: 500, ref body }) if body == "boom"
    ));
}

// ── Event creation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_schedule_posts_subject_times_and_notes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/g/api/v1/schedule/events"))
        .and(body_partial_json(json!({
            "subject": { "value": "Design review" },
            "start": { "dateTime": "2025-01-15T14:00:00+09:00" },
            "end": { "dateTime": "2025-01-15T15:00:00+09:00" },
            "notes": { "value": "bring diagrams" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "999" })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client_for(&server, "Asia/Tokyo")
        .create_schedule(
            "Design review",
            "2025-01-15T14:00:00+09:00",
            "2025-01-15T15:00:00+09:00",
            Some("bring diagrams"),
        )
        .await
        .unwrap();
    assert_eq!(created["id"], "999");
}

#[tokio::test]
async fn create_meeting_lists_attendees() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/g/api/v1/schedule/events"))
        .and(body_partial_json(json!({
            "attendees": [
                { "type": "USER", "id": "123" },
                { "type": "USER", "id": "456" },
                { "type": "USER", "id": "789" },
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "999",
            "attendees": [{ "id": "123" }, { "id": "456" }, { "id": "789" }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids = vec!["123".to_string(), "456".to_string(), "789".to_string()];
    let created = client_for(&server, "Asia/Tokyo")
        .create_meeting(
            "Team Meeting",
            "2025-01-15T14:00:00+09:00",
            "2025-01-15T15:00:00+09:00",
            &ids,
            None,
        )
        .await
        .unwrap();
    assert_eq!(created["attendees"].as_array().map(Vec::len), Some(3));
}

// ── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_user_info_defaults_to_me() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1", "name": "Alice" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/users/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "42", "name": "Bob" })))
        .mount(&server)
        .await;

    let client = client_for(&server, "UTC");
    assert_eq!(client.get_user_info(None).await.unwrap()["name"], "Alice");
    assert_eq!(client.get_user_info(Some("42")).await.unwrap()["name"], "Bob");
}

#[tokio::test]
async fn search_users_passes_name_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/base/users"))
        .and(query_param("name", "tanaka"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "id": "7", "name": "Tanaka" }]
        })))
        .mount(&server)
        .await;

    let users = client_for(&server, "UTC").search_users("tanaka", 5).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], "7");
}

#[tokio::test]
async fn search_users_unavailable_endpoint_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/base/users"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"{"code":"GRN_REST_API_00101","message":"not found"}"#),
        )
        .mount(&server)
        .await;

    let users = client_for(&server, "UTC").search_users("x", 20).await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn search_users_other_errors_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/base/users"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = client_for(&server, "UTC").search_users("x", 20).await.unwrap_err();
    assert_eq!(err.kind(), "source_fetch");
}

#[tokio::test]
async fn get_applications_returns_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/base/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "applications": [{ "code": "schedule" }, { "code": "space" }]
        })))
        .mount(&server)
        .await;

    let apps = client_for(&server, "UTC").get_applications().await.unwrap();
    assert_eq!(apps.len(), 2);
}

// ── Meeting time search end to end ──────────────────────────────────────────

#[tokio::test]
async fn find_available_time_merges_both_calendars() {
    let server = MockServer::start().await;

    // Counterpart's calendar (more specific matcher mounted first).
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .and(query_param("target", "123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [garoon_event("2", "2025-01-15T14:00:00+09:00", "2025-01-15T15:00:00+09:00")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Caller's own calendar; one record is unreadable and must be skipped.
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                garoon_event("1", "2025-01-15T09:00:00+09:00", "2025-01-15T11:00:00+09:00"),
                { "id": "3", "start": { "dateTime": "garbage" }, "end": { "dateTime": "garbage" } },
                { "id": "4", "start": 17 },
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = FindAvailableTimeRequest::new("123", "2025-01-15", "2025-01-15", 60);
    let slots = client_for(&server, "Asia/Tokyo")
        .find_available_time(&request)
        .await
        .unwrap();

    let starts: Vec<String> = slots.iter().map(|s| s.start.to_rfc3339()).collect();
    assert_eq!(
        starts,
        vec![
            "2025-01-15T11:00:00+09:00",
            "2025-01-15T13:00:00+09:00",
            "2025-01-15T15:00:00+09:00",
        ]
    );
}

#[tokio::test]
async fn find_available_time_fails_when_one_fetch_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .and(query_param("target", "123"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": [] })))
        .mount(&server)
        .await;

    let request = FindAvailableTimeRequest::new("123", "2025-01-15", "2025-01-15", 60);
    let err = client_for(&server, "Asia/Tokyo")
        .find_available_time(&request)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "source_fetch");
}

#[tokio::test]
async fn loosely_shaped_records_still_block_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .and(query_param("target", "123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/g/api/v1/schedule/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                {
                    "id": 42,
                    "subject": { "value": null },
                    "start": { "dateTime": "2025-01-15T09:00:00+09:00" },
                    "end": { "dateTime": "2025-01-15T11:00:00+09:00" }
                },
                {
                    "id": "5",
                    "subject": 7,
                    "start": { "dateTime": "2025-01-15T13:00:00" },
                    "end": { "dateTime": "2025-01-15T14:00:00" }
                }
            ]
        })))
        .mount(&server)
        .await;

    let request = FindAvailableTimeRequest::new("123", "2025-01-15", "2025-01-15", 60);
    let slots = client_for(&server, "Asia/Tokyo")
        .find_available_time(&request)
        .await
        .unwrap();

    let starts: Vec<String> = slots.iter().map(|s| s.start.to_rfc3339()).collect();
    assert_eq!(
        starts,
        vec![
            "2025-01-15T11:00:00+09:00",
            "2025-01-15T14:00:00+09:00",
            "2025-01-15T15:00:00+09:00",
        ]
    );
}

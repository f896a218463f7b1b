//! Garoon REST API client.
//!
//! Authenticates every request with the `X-Cybozu-Authorization` header
//! (base64 of `username:password`). There is no session state: the
//! [`authenticate`](GaroonClient::authenticate) probe only checks that the
//! credentials work. No retries happen here; a failed request is returned to
//! the caller as a [`FetchError`].

use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use chrono::{NaiveDate, NaiveTime, SecondsFormat};
use chrono_tz::Tz;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde_json::{json, Value};
use slot_engine::config::parse_date;
use slot_engine::dst::localize;
use slot_engine::{RawEvent, Slot};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::GaroonConfig;
use crate::error::{FetchError, GaroonError, Result};
use crate::scheduler::{self, FindAvailableTimeRequest};
use crate::source::CalendarSource;

const AUTH_HEADER: &str = "X-Cybozu-Authorization";
const USER_AGENT: &str = "GaroonMCPServer/1.0";

const EVENTS_PATH: &str = "/g/api/v1/schedule/events";
const USERS_PATH: &str = "/g/api/v1/users/";
const BASE_USERS_PATH: &str = "/g/api/v1/base/users";
const APPLICATIONS_PATH: &str = "/g/api/v1/base/applications";

/// Garoon's "endpoint not available" error code.
const ENDPOINT_UNAVAILABLE: &str = "GRN_REST_API_00101";

pub const DEFAULT_USER_SEARCH_LIMIT: u32 = 20;

/// A new schedule entry. Attendees are only sent when non-empty.
#[derive(Debug, Clone, Default)]
pub struct NewEvent<'a> {
    pub subject: &'a str,
    pub start: &'a str,
    pub end: &'a str,
    pub description: Option<&'a str>,
    pub attendee_ids: &'a [String],
}

impl NewEvent<'_> {
    fn to_body(&self) -> Value {
        let mut body = json!({
            "subject": { "value": self.subject },
            "start": { "dateTime": self.start },
            "end": { "dateTime": self.end },
        });
        if let Some(notes) = self.description.filter(|d| !d.is_empty()) {
            body["notes"] = json!({ "value": notes });
        }
        if !self.attendee_ids.is_empty() {
            body["attendees"] = self
                .attendee_ids
                .iter()
                .map(|id| json!({ "type": "USER", "id": id }))
                .collect();
        }
        body
    }
}

pub struct GaroonClient {
    http: reqwest::Client,
    config: GaroonConfig,
    /// Resolved once so the fetch path cannot hit a URL error.
    events_url: Url,
}

impl GaroonClient {
    /// Build a client from configuration. No request is sent.
    ///
    /// # Errors
    /// Returns `GaroonError::InvalidConfig` if the credentials cannot form a
    /// header value or the HTTP client cannot be built.
    pub fn new(config: GaroonConfig) -> Result<Self> {
        let token = BASE64_STANDARD.encode(format!("{}:{}", config.username, config.password));
        let mut auth = HeaderValue::from_str(&token)
            .map_err(|e| GaroonError::InvalidConfig(format!("invalid credentials: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GaroonError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        let events_url = resolve(&config.base_url, EVENTS_PATH)?;

        Ok(Self {
            http,
            config,
            events_url,
        })
    }

    pub fn config(&self) -> &GaroonConfig {
        &self.config
    }

    pub fn timezone(&self) -> Tz {
        self.config.timezone
    }

    /// Check the credentials with a one-event probe of the schedule API.
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn authenticate(&self) -> Result<()> {
        let request = self
            .http
            .get(self.events_url.clone())
            .query(&[("limit", "1"), ("fields", "id,subject")]);

        match self.send(request).await {
            Ok(_) => {
                info!("authenticated with Garoon");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Garoon authentication failed");
                Err(FetchError::Authentication(err.to_string()).into())
            }
        }
    }

    /// Fetch raw event records for a `YYYY-MM-DD` date range, inclusive.
    ///
    /// The range runs from 00:00:00 on `start_date` to 23:59:59 on `end_date`
    /// in the configured timezone. `user_id = None` reads the caller's own
    /// calendar.
    ///
    /// # Errors
    /// `GaroonError::Validation` for malformed dates (no request is sent),
    /// `GaroonError::Fetch` if the request fails.
    pub async fn get_schedule(
        &self,
        start_date: &str,
        end_date: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<Value>> {
        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;
        Ok(self.fetch_event_values(start, end, user_id).await?)
    }

    /// Create an event on the caller's calendar.
    pub async fn create_schedule(
        &self,
        subject: &str,
        start: &str,
        end: &str,
        description: Option<&str>,
    ) -> Result<Value> {
        self.create_event(&NewEvent {
            subject,
            start,
            end,
            description,
            attendee_ids: &[],
        })
        .await
    }

    /// Create an event with the given users as attendees.
    pub async fn create_meeting(
        &self,
        subject: &str,
        start: &str,
        end: &str,
        attendee_ids: &[String],
        description: Option<&str>,
    ) -> Result<Value> {
        self.create_event(&NewEvent {
            subject,
            start,
            end,
            description,
            attendee_ids,
        })
        .await
    }

    #[instrument(skip(self, event), fields(subject = %event.subject, attendees = event.attendee_ids.len()))]
    pub async fn create_event(&self, event: &NewEvent<'_>) -> Result<Value> {
        let request = self.http.post(self.events_url.clone()).json(&event.to_body());
        let created = self.send(request).await?;
        info!(id = created.get("id").and_then(serde_json::Value::as_str).unwrap_or("?"), "event created");
        Ok(created)
    }

    /// Look up a user, or the authenticated user when `user_id` is `None`.
    pub async fn get_user_info(&self, user_id: Option<&str>) -> Result<Value> {
        let url = match user_id {
            Some(id) => {
                let mut url = self.url(USERS_PATH)?;
                url.path_segments_mut()
                    .map_err(|_| GaroonError::InvalidConfig("base URL cannot carry a path".into()))?
                    .pop_if_empty()
                    .push(id);
                url
            }
            None => self.url(&format!("{USERS_PATH}me"))?,
        };
        Ok(self.send(self.http.get(url)).await?)
    }

    /// List the applications enabled for the caller.
    pub async fn get_applications(&self) -> Result<Vec<Value>> {
        let response = self.send(self.http.get(self.url(APPLICATIONS_PATH)?)).await?;
        Ok(take_array(response, "applications")?)
    }

    /// Search users by name.
    ///
    /// Some Garoon editions do not expose the user list endpoint; that case
    /// yields an empty list rather than an error.
    #[instrument(skip(self))]
    pub async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<Value>> {
        let limit = limit.to_string();
        let request = self
            .http
            .get(self.url(BASE_USERS_PATH)?)
            .query(&[("name", query), ("limit", limit.as_str())]);

        match self.send(request).await {
            Ok(response) => Ok(take_array(response, "users")?),
            Err(FetchError::Status { body, status }) if body.contains(ENDPOINT_UNAVAILABLE) => {
                warn!(status, "user search endpoint not available");
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Propose up to three meeting slots free for both the caller and `user_id`.
    pub async fn find_available_time(&self, request: &FindAvailableTimeRequest) -> Result<Vec<Slot>> {
        scheduler::find_available_time(self, self.config.timezone, request).await
    }

    async fn fetch_event_values(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        user_id: Option<&str>,
    ) -> std::result::Result<Vec<Value>, FetchError> {
        let tz = self.config.timezone;
        let range_start = localize(&tz, start.and_time(NaiveTime::MIN));
        let range_end = localize(&tz, end.and_hms_opt(23, 59, 59).unwrap_or_else(|| end.and_time(NaiveTime::MIN)));

        let mut query = vec![
            ("rangeStart", range_start.to_rfc3339_opts(SecondsFormat::Secs, false)),
            ("rangeEnd", range_end.to_rfc3339_opts(SecondsFormat::Secs, false)),
        ];
        // Garoon requires targetType whenever target is given.
        if let Some(user) = user_id {
            query.push(("target", user.to_string()));
            query.push(("targetType", "user".to_string()));
        }

        let request = self.http.get(self.events_url.clone()).query(&query);
        let response = self.send(request).await?;
        let events = take_array(response, "events")?;
        debug!(count = events.len(), user = user_id.unwrap_or("me"), "fetched events");
        Ok(events)
    }

    fn url(&self, path: &str) -> Result<Url> {
        resolve(&self.config.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> std::result::Result<Value, FetchError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Decode(format!("invalid JSON body: {e}")))
    }
}

#[async_trait]
impl CalendarSource for GaroonClient {
    async fn fetch_events(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        user_id: Option<&str>,
    ) -> std::result::Result<Vec<RawEvent>, FetchError> {
        let values = self.fetch_event_values(start, end, user_id).await?;

        let mut events = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<RawEvent>(value) {
                Ok(event) => events.push(event),
                Err(err) => warn!(error = %err, "skipping unreadable event record"),
            }
        }
        Ok(events)
    }
}

fn resolve(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| GaroonError::InvalidConfig(format!("cannot build URL for '{path}': {e}")))
}

/// Pull `key` out of a response object as an array. A missing key is empty.
fn take_array(mut response: Value, key: &str) -> std::result::Result<Vec<Value>, FetchError> {
    match response.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(FetchError::Decode(format!(
            "expected '{key}' to be an array, got {other}"
        ))),
    }
}

//! Tool definitions and dispatch.
//!
//! Each tool deserializes its arguments into a typed struct, calls the
//! matching [`GaroonClient`] method, and renders the result as JSON text.

use garoon_client::{FindAvailableTimeRequest, GaroonClient, GaroonError, DEFAULT_USER_SEARCH_LIMIT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use crate::types::ToolDefinition;

pub const GET_SCHEDULE: &str = "get_schedule";
pub const CREATE_SCHEDULE: &str = "create_schedule";
pub const SEARCH_USERS: &str = "search_users";
pub const FIND_AVAILABLE_TIME: &str = "find_available_time";
pub const CREATE_MEETING: &str = "create_meeting";

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Garoon(#[from] GaroonError),
}

#[derive(Debug, Deserialize)]
pub struct GetScheduleArgs {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduleArgs {
    pub subject: String,
    pub start_datetime: String,
    pub end_datetime: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_limit() -> u32 {
    DEFAULT_USER_SEARCH_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct SearchUsersArgs {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateMeetingArgs {
    pub subject: String,
    pub start_datetime: String,
    pub end_datetime: String,
    pub attendee_ids: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Every tool this server exposes, in listing order.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: GET_SCHEDULE,
            description: "Get schedule events from Garoon for yourself or other users",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "start_date": { "type": "string", "description": "Start date (YYYY-MM-DD format)" },
                    "end_date": { "type": "string", "description": "End date (YYYY-MM-DD format)" },
                    "user_id": {
                        "type": "string",
                        "description": "User ID to get schedule for. If not specified, returns your own schedule. Use search_users tool to find user IDs."
                    }
                },
                "required": ["start_date", "end_date"]
            }),
        },
        ToolDefinition {
            name: CREATE_SCHEDULE,
            description: "Create a new schedule event in Garoon",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "subject": { "type": "string", "description": "Event subject/title" },
                    "start_datetime": { "type": "string", "description": "Start datetime (ISO format)" },
                    "end_datetime": { "type": "string", "description": "End datetime (ISO format)" },
                    "description": { "type": "string", "description": "Event description (optional)" }
                },
                "required": ["subject", "start_datetime", "end_datetime"]
            }),
        },
        ToolDefinition {
            name: SEARCH_USERS,
            description: "Search for users in Garoon by name or other criteria",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query (user name, email, etc.)" },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results to return",
                        "default": DEFAULT_USER_SEARCH_LIMIT
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: FIND_AVAILABLE_TIME,
            description: "Find available time slots for a meeting with another user",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "user_id": { "type": "string", "description": "Other user's Garoon user ID" },
                    "start_date": { "type": "string", "description": "Search start date (YYYY-MM-DD format)" },
                    "end_date": { "type": "string", "description": "Search end date (YYYY-MM-DD format)" },
                    "duration_minutes": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Required meeting duration in minutes"
                    },
                    "start_time": {
                        "type": "string",
                        "description": "Daily start time (HH:MM format, default: 09:00)",
                        "default": "09:00"
                    },
                    "end_time": {
                        "type": "string",
                        "description": "Daily end time (HH:MM format, default: 18:00)",
                        "default": "18:00"
                    },
                    "exclude_lunch": {
                        "type": "boolean",
                        "description": "Exclude lunch time 12:00-13:00 (default: true)",
                        "default": true
                    }
                },
                "required": ["user_id", "start_date", "end_date", "duration_minutes"]
            }),
        },
        ToolDefinition {
            name: CREATE_MEETING,
            description: "Create a meeting with attendees",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "subject": { "type": "string", "description": "Meeting subject/title" },
                    "start_datetime": { "type": "string", "description": "Start datetime (ISO format)" },
                    "end_datetime": { "type": "string", "description": "End datetime (ISO format)" },
                    "attendee_ids": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "List of attendee user IDs"
                    },
                    "description": { "type": "string", "description": "Meeting description (optional)" }
                },
                "required": ["subject", "start_datetime", "end_datetime", "attendee_ids"]
            }),
        },
    ]
}

/// Run tool `name` with JSON `arguments`, returning the text to show the caller.
pub async fn call_tool(client: &GaroonClient, name: &str, arguments: Value) -> Result<String, ToolError> {
    match name {
        GET_SCHEDULE => {
            let args: GetScheduleArgs = parse_args(GET_SCHEDULE, arguments)?;
            let events = client
                .get_schedule(&args.start_date, &args.end_date, args.user_id.as_deref())
                .await?;
            Ok(render(&events))
        }
        CREATE_SCHEDULE => {
            let args: CreateScheduleArgs = parse_args(CREATE_SCHEDULE, arguments)?;
            let created = client
                .create_schedule(
                    &args.subject,
                    &args.start_datetime,
                    &args.end_datetime,
                    args.description.as_deref(),
                )
                .await?;
            Ok(format!("Schedule created: {}", render(&created)))
        }
        SEARCH_USERS => {
            let args: SearchUsersArgs = parse_args(SEARCH_USERS, arguments)?;
            let users = client.search_users(&args.query, args.limit).await?;
            Ok(render(&users))
        }
        FIND_AVAILABLE_TIME => {
            let request: FindAvailableTimeRequest = parse_args(FIND_AVAILABLE_TIME, arguments)?;
            let slots = client.find_available_time(&request).await?;
            Ok(render(&slots))
        }
        CREATE_MEETING => {
            let args: CreateMeetingArgs = parse_args(CREATE_MEETING, arguments)?;
            let created = client
                .create_meeting(
                    &args.subject,
                    &args.start_datetime,
                    &args.end_datetime,
                    &args.attendee_ids,
                    args.description.as_deref(),
                )
                .await?;
            Ok(format!("Meeting created: {}", render(&created)))
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

fn parse_args<T: DeserializeOwned>(tool: &'static str, arguments: Value) -> Result<T, ToolError> {
    // Tools called without arguments send null; treat it as an empty object.
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|source| ToolError::InvalidArguments { tool, source })
}

fn render<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable result: {e}>"))
}

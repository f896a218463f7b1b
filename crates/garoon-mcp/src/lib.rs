//! # garoon-mcp
//!
//! Model Context Protocol server exposing Garoon schedules and the two-party
//! meeting time search as tools, over line-delimited JSON-RPC on stdio.
//!
//! ## Tools
//!
//! - `get_schedule`: events for yourself or another user
//! - `create_schedule`: create an event on your calendar
//! - `search_users`: find user ids by name
//! - `find_available_time`: up to three slots free for you and another user
//! - `create_meeting`: create an event with attendees

pub mod server;
pub mod tools;
pub mod types;

pub use server::{run_stdio, McpServer};

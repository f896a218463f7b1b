//! `garoon-mcp`: MCP server and one-shot CLI for Garoon.
//!
//! ## Usage
//!
//! ```sh
//! # Serve MCP over stdio (default)
//! garoon-mcp
//! garoon-mcp serve
//!
//! # Find up to three 60-minute slots free for you and user 123
//! garoon-mcp find-time --user-id 123 --start-date 2025-01-15 --end-date 2025-01-17 --duration 60
//!
//! # Custom business hours, lunch allowed
//! garoon-mcp find-time --user-id 123 --start-date 2025-01-15 --end-date 2025-01-15 \
//!     --duration 30 --start-time 10:00 --end-time 16:00 --include-lunch
//!
//! # Read a schedule, search users, show the current user
//! garoon-mcp schedule --start-date 2025-01-15 --end-date 2025-01-15 --user-id 123
//! garoon-mcp search-users tanaka --limit 5
//! garoon-mcp whoami
//!
//! # Print the MCP tool definitions
//! garoon-mcp tools
//! ```
//!
//! Credentials come from `GAROON_BASE_URL`, `GAROON_USERNAME` and
//! `GAROON_PASSWORD` (a `.env` file is read if present). Logs go to stderr;
//! set `RUST_LOG` to adjust.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use garoon_client::{FindAvailableTimeRequest, GaroonClient, GaroonConfig, DEFAULT_USER_SEARCH_LIMIT};
use garoon_mcp::{run_stdio, tools, McpServer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "garoon-mcp",
    version,
    about = "Garoon MCP server and meeting time finder"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// IANA timezone for date ranges and slot output (overrides GAROON_TIMEZONE)
    #[arg(long, global = true)]
    timezone: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (the default)
    Serve,
    /// Find up to three meeting slots free for you and another user
    FindTime {
        /// The other user's Garoon user ID
        #[arg(long)]
        user_id: String,
        /// First day to search (YYYY-MM-DD)
        #[arg(long)]
        start_date: String,
        /// Last day to search, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end_date: String,
        /// Meeting length in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,
        /// Daily start of business hours (HH:MM)
        #[arg(long, default_value = "09:00")]
        start_time: String,
        /// Daily end of business hours (HH:MM)
        #[arg(long, default_value = "18:00")]
        end_time: String,
        /// Allow slots during 12:00-13:00
        #[arg(long)]
        include_lunch: bool,
    },
    /// Print schedule events for a date range
    Schedule {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start_date: String,
        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end_date: String,
        /// Another user's ID (defaults to yourself)
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Search users by name
    SearchUsers {
        query: String,
        #[arg(long, default_value_t = DEFAULT_USER_SEARCH_LIMIT)]
        limit: u32,
    },
    /// Show the authenticated user
    Whoami,
    /// Print the MCP tool definitions as JSON
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let client = connect(cli.timezone.as_deref())?;
            client
                .authenticate()
                .await
                .context("Failed to initialize Garoon client")?;
            let server = McpServer::new(client);
            run_stdio(&server).await.context("MCP stdio transport failed")?;
        }
        Commands::FindTime {
            user_id,
            start_date,
            end_date,
            duration,
            start_time,
            end_time,
            include_lunch,
        } => {
            let request = FindAvailableTimeRequest {
                user_id,
                start_date,
                end_date,
                duration_minutes: duration,
                start_time,
                end_time,
                exclude_lunch: !include_lunch,
            };
            let client = connect(cli.timezone.as_deref())?;
            let slots = client
                .find_available_time(&request)
                .await
                .context("Failed to find available time")?;
            print_json(&slots)?;
        }
        Commands::Schedule {
            start_date,
            end_date,
            user_id,
        } => {
            let client = connect(cli.timezone.as_deref())?;
            let events = client
                .get_schedule(&start_date, &end_date, user_id.as_deref())
                .await
                .context("Failed to get schedule")?;
            print_json(&events)?;
        }
        Commands::SearchUsers { query, limit } => {
            let client = connect(cli.timezone.as_deref())?;
            let users = client
                .search_users(&query, limit)
                .await
                .context("Failed to search users")?;
            print_json(&users)?;
        }
        Commands::Whoami => {
            let client = connect(cli.timezone.as_deref())?;
            let user = client
                .get_user_info(None)
                .await
                .context("Failed to get user info")?;
            print_json(&user)?;
        }
        Commands::Tools => {
            print_json(&tools::definitions())?;
        }
    }

    Ok(())
}

/// Logs go to stderr: stdout carries JSON-RPC in `serve` mode.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn connect(timezone: Option<&str>) -> Result<GaroonClient> {
    let mut config = GaroonConfig::from_env().context("Failed to load Garoon configuration")?;
    if let Some(tz) = timezone {
        config = config.with_timezone(tz).context("Invalid --timezone")?;
    }
    GaroonClient::new(config).context("Failed to build Garoon client")
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", pretty);
    Ok(())
}

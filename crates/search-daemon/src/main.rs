//! Chat Search Daemon
//!
//! Keeps a full-text index of chat events in sync with a homeserver and
//! answers queries over HTTP.
//!
//! # Usage
//!
//! ```bash
//! search-daemon start [--port PORT] [--index-path PATH] [--homeserver URL]
//! search-daemon query TERM [--limit N] [--room ROOM]... [--key FIELD]...
//! search-daemon rooms
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/chat-search/config.toml)
//! 3. Environment variables (SEARCH_*, nested with `__`)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use search_bridge::QueryRequest;
use search_daemon::{handle_query, handle_rooms, start_daemon, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            port,
            index_path,
            homeserver,
        } => {
            start_daemon(
                cli.config.as_deref(),
                port,
                index_path.as_deref(),
                homeserver.as_deref(),
                cli.log_level.as_deref(),
            )
            .await?;
        }
        Commands::Query {
            term,
            limit,
            rooms,
            keys,
        } => {
            let request = QueryRequest {
                search_term: term,
                keys,
                room_ids: rooms,
                limit,
                offset: 0,
            };
            handle_query(cli.config.as_deref(), cli.log_level.as_deref(), request)?;
        }
        Commands::Rooms => {
            handle_rooms(cli.config.as_deref(), cli.log_level.as_deref()).await?;
        }
    }

    Ok(())
}

//! Search daemon library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (start, query, rooms)
//! - `server`: axum routes for event intake, queries and context

pub mod cli;
pub mod commands;
pub mod server;

pub use cli::{Cli, Commands};
pub use commands::{build_client, handle_query, handle_rooms, init_logging, open_engine, start_daemon};
pub use server::{router, run_server_with_shutdown, AppState};

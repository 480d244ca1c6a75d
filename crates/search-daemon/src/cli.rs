//! CLI argument parsing for the search daemon.
//!
//! CLI flags override every other configuration source.

use clap::{Parser, Subcommand};

/// Chat Search Daemon
///
/// Keeps a full-text index of chat events and answers queries over HTTP.
#[derive(Parser, Debug)]
#[command(name = "search-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/chat-search/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Override listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override index directory
        #[arg(long)]
        index_path: Option<String>,

        /// Override homeserver URL
        #[arg(long)]
        homeserver: Option<String>,
    },

    /// Query the local index and print the response as JSON
    Query {
        /// Search term in query syntax
        term: String,

        /// Maximum rows
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Restrict to a room (repeatable)
        #[arg(short, long = "room")]
        rooms: Vec<String>,

        /// Content fields to search (repeatable: body, name, topic, url)
        #[arg(short, long = "key")]
        keys: Vec<String>,
    },

    /// List rooms the configured account has joined
    Rooms,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_start_defaults() {
        let cli = Cli::parse_from(["search-daemon", "start"]);
        match cli.command {
            Commands::Start {
                port,
                index_path,
                homeserver,
            } => {
                assert_eq!(port, None);
                assert_eq!(index_path, None);
                assert_eq!(homeserver, None);
            }
            _ => panic!("Expected Start command"),
        }
    }

    #[test]
    fn test_cli_start_with_overrides() {
        let cli = Cli::parse_from([
            "search-daemon",
            "start",
            "-p",
            "8080",
            "--index-path",
            "/tmp/idx",
            "--homeserver",
            "https://hs.example.org",
        ]);
        match cli.command {
            Commands::Start {
                port,
                index_path,
                homeserver,
            } => {
                assert_eq!(port, Some(8080));
                assert_eq!(index_path.as_deref(), Some("/tmp/idx"));
                assert_eq!(homeserver.as_deref(), Some("https://hs.example.org"));
            }
            _ => panic!("Expected Start command"),
        }
    }

    #[test]
    fn test_cli_query() {
        let cli = Cli::parse_from([
            "search-daemon",
            "query",
            "cat",
            "-n",
            "5",
            "--room",
            "!a:x",
            "--room",
            "!b:x",
        ]);
        match cli.command {
            Commands::Query {
                term, limit, rooms, keys,
            } => {
                assert_eq!(term, "cat");
                assert_eq!(limit, Some(5));
                assert_eq!(rooms, vec!["!a:x", "!b:x"]);
                assert!(keys.is_empty());
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_cli_rooms_with_globals() {
        let cli = Cli::parse_from(["search-daemon", "rooms", "--config", "/etc/search.toml", "-l", "debug"]);
        assert!(matches!(cli.command, Commands::Rooms));
        assert_eq!(cli.config.as_deref(), Some("/etc/search.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}

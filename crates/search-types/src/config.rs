//! Configuration loading for the search bridge.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives in the platform config dir
//! (e.g. ~/.config/chat-search/config.toml).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::TypesError;

const APP_NAME: &str = "chat-search";

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the homeserver client API
    #[serde(default = "default_homeserver_url")]
    pub homeserver_url: String,

    /// Token used for outbound client API calls
    #[serde(default)]
    pub access_token: Option<String>,

    /// Token the homeserver presents when pushing transactions
    #[serde(default)]
    pub hs_token: Option<String>,

    /// HTTP server host
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// HTTP server port
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Path to the Tantivy index directory
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Memory budget for the index writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Timeout for a single homeserver round-trip
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Skip TLS certificate verification for homeserver calls.
    /// Must be explicitly enabled.
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Row limit for queries that do not ask for one
    #[serde(default = "default_query_limit")]
    pub default_limit: usize,
}

fn default_homeserver_url() -> String {
    "http://localhost:8008".to_string()
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_bind_port() -> u16 {
    9999
}

fn default_index_path() -> String {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.data_local_dir().join("index"))
        .unwrap_or_else(|| PathBuf::from("./index"))
        .to_string_lossy()
        .to_string()
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_query_limit() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            homeserver_url: default_homeserver_url(),
            access_token: None,
            hs_token: None,
            bind_host: default_bind_host(),
            bind_port: default_bind_port(),
            index_path: default_index_path(),
            writer_memory_mb: default_writer_memory_mb(),
            request_timeout_secs: default_request_timeout_secs(),
            accept_invalid_certs: false,
            log_level: default_log_level(),
            default_limit: default_query_limit(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file in the platform config dir
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (SEARCH_*, `__` for nesting)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, TypesError> {
        let config_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("homeserver_url", default_homeserver_url())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("bind_host", default_bind_host())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("bind_port", default_bind_port() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("index_path", default_index_path())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SEARCH_INDEX_PATH, SEARCH_BIND_PORT, SEARCH_ACCEPT_INVALID_CERTS, ...
        builder = builder.add_source(
            Environment::with_prefix("SEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| TypesError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the daemon cannot start with.
    pub fn validate(&self) -> Result<(), TypesError> {
        if !(self.homeserver_url.starts_with("http://")
            || self.homeserver_url.starts_with("https://"))
        {
            return Err(TypesError::Config(format!(
                "homeserver_url must be an http(s) URL, got {}",
                self.homeserver_url
            )));
        }
        if self.bind_port == 0 {
            return Err(TypesError::Config("bind_port must be > 0".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(TypesError::Config(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.writer_memory_mb == 0 {
            return Err(TypesError::Config("writer_memory_mb must be > 0".to_string()));
        }
        Ok(())
    }

    /// Socket address for the HTTP server
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }

    /// Expand ~ in index_path to the home directory
    pub fn expanded_index_path(&self) -> PathBuf {
        if let Some(rest) = self.index_path.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new() {
                return home.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.index_path)
    }
}

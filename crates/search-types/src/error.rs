//! Error types shared by the bridge crates.

use thiserror::Error;

/// Errors raised while loading configuration or decoding domain values.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A string could not be split into a room/event key
    #[error("Invalid index key: {0}")]
    InvalidKey(String),
}

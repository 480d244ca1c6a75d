//! Error types for the bridge.

use search_client::ClientError;
use search_index::SearchError;
use thiserror::Error;

/// Errors surfaced by bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Index engine failure outside per-event processing
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Homeserver call failed
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Caller supplied an unusable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

//! Search error types.

use thiserror::Error;

/// Errors that can occur during index operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Query parse error
    #[error("Query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Writer lock poisoned
    #[error("Index is locked: {0}")]
    IndexLocked(String),

    /// Query parameters outside what the engine will serve
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The engine refused a write or delete
    #[error("Index rejected operation: {0}")]
    Rejected(String),
}

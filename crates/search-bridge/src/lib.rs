//! # search-bridge
//!
//! Keeps the search index in step with incoming chat events and shapes
//! query results for callers.
//!
//! ## Components
//! - [`filter`]: decides whether an event is indexed, redacted or dropped
//! - [`pipeline`]: applies batches of events to an [`IndexEngine`]
//! - [`response`]: turns engine hits into [`QueryResponse`] rows
//! - [`service`]: query and context resolution entry points
//!
//! [`IndexEngine`]: search_index::IndexEngine

pub mod error;
pub mod filter;
pub mod outcome;
pub mod pipeline;
pub mod response;
pub mod service;

pub use error::BridgeError;
pub use filter::{classify, should_index, Disposition};
pub use outcome::{BatchReport, EventOutcome, OutcomeKind};
pub use pipeline::{build_document, IndexingPipeline};
pub use response::{calculate_highlights, QueryResponse, ResponseRow};
pub use service::{ContextRequest, ContextResponse, ContextResult, QueryRequest, SearchService};

//! # search-index
//!
//! Full-text index of chat events using Tantivy.
//!
//! ## Features
//! - Embedded Tantivy index with MmapDirectory for persistence
//! - One document per event, keyed by `room_id/event_id`
//! - Upsert and delete by key
//! - Scored queries with per-field matched terms for highlighting
//! - [`IndexEngine`] trait so the bridge can run against any store

pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod indexer;
pub mod schema;
pub mod searcher;

pub use document::event_to_doc;
pub use engine::{IndexEngine, TantivyEngine};
pub use error::SearchError;
pub use index::{SearchIndex, SearchIndexConfig};
pub use indexer::SearchIndexer;
pub use schema::{build_event_schema, SearchSchema};
pub use searcher::{EventSearcher, QueryHits, SearchHit, SearchRequest, MAX_RESULT_WINDOW};

//! Index engine boundary.
//!
//! The bridge only needs "index by key", "delete by key" and "query". The
//! [`IndexEngine`] trait captures that surface; [`TantivyEngine`] is the
//! on-disk implementation.

use search_types::{IndexDocument, IndexKey};
use tracing::debug;

use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::indexer::SearchIndexer;
use crate::searcher::{EventSearcher, QueryHits, SearchRequest};

/// Store of event documents addressed by [`IndexKey`].
pub trait IndexEngine: Send + Sync {
    /// Insert or replace the document under `key`.
    fn index(&self, key: &IndexKey, document: &IndexDocument) -> Result<(), SearchError>;

    /// Remove the document under `key`. Unknown keys are not an error.
    fn delete(&self, key: &IndexKey) -> Result<(), SearchError>;

    /// Make pending writes visible to queries.
    fn commit(&self) -> Result<(), SearchError>;

    /// Whether a committed document exists under `key`.
    fn contains(&self, key: &IndexKey) -> Result<bool, SearchError>;

    /// Run a query.
    fn query(&self, request: &SearchRequest) -> Result<QueryHits, SearchError>;
}

/// Tantivy-backed engine: one writer and one reader over a SearchIndex.
pub struct TantivyEngine {
    indexer: SearchIndexer,
    searcher: EventSearcher,
}

impl TantivyEngine {
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        Ok(Self {
            indexer: SearchIndexer::new(index)?,
            searcher: EventSearcher::new(index)?,
        })
    }

    /// Number of committed documents.
    pub fn num_docs(&self) -> u64 {
        self.searcher.num_docs()
    }
}

impl IndexEngine for TantivyEngine {
    fn index(&self, key: &IndexKey, document: &IndexDocument) -> Result<(), SearchError> {
        self.indexer.index_document(key, document)
    }

    fn delete(&self, key: &IndexKey) -> Result<(), SearchError> {
        self.indexer.delete_document(key)
    }

    fn commit(&self) -> Result<(), SearchError> {
        let opstamp = self.indexer.commit()?;
        self.searcher.reload()?;
        debug!(opstamp, "Engine commit visible to searcher");
        Ok(())
    }

    fn contains(&self, key: &IndexKey) -> Result<bool, SearchError> {
        self.searcher.contains(key)
    }

    fn query(&self, request: &SearchRequest) -> Result<QueryHits, SearchError> {
        self.searcher.search(request)
    }
}

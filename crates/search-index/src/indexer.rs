//! Search indexer for adding and removing event documents.
//!
//! The indexer wraps IndexWriter with shared access via Arc<Mutex>.
//! Documents are not visible until commit() is called.

use std::sync::{Arc, Mutex};

use tantivy::{IndexWriter, Term};
use tracing::{debug, info};

use search_types::{IndexDocument, IndexKey};

use crate::document::event_to_doc;
use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::SearchSchema;

/// Manages document write operations.
pub struct SearchIndexer {
    writer: Arc<Mutex<IndexWriter>>,
    schema: SearchSchema,
}

impl SearchIndexer {
    /// Create a new indexer from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let writer = index.writer()?;
        let schema = index.schema().clone();

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            schema,
        })
    }

    /// Index an event document under `key`.
    ///
    /// If a document with the same key exists, it is replaced.
    pub fn index_document(&self, key: &IndexKey, document: &IndexDocument) -> Result<(), SearchError> {
        let doc = event_to_doc(&self.schema, key, document);

        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let term = Term::from_field_text(self.schema.key, key.as_str());
        writer.delete_term(term);
        writer.add_document(doc)?;

        debug!(key = %key, "Indexed event document");
        Ok(())
    }

    /// Delete the document stored under `key`. Unknown keys are a no-op.
    pub fn delete_document(&self, key: &IndexKey) -> Result<(), SearchError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let term = Term::from_field_text(self.schema.key, key.as_str());
        writer.delete_term(term);

        debug!(key = %key, "Deleted document");
        Ok(())
    }

    /// Commit pending changes to make them searchable.
    pub fn commit(&self) -> Result<u64, SearchError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let opstamp = writer.commit()?;
        info!(opstamp, "Committed index changes");
        Ok(opstamp)
    }
}

//! On-disk event index.
//!
//! One directory holds one Tantivy index built from [`build_event_schema`].
//! Writers and readers are handed out to [`SearchIndexer`] and
//! [`EventSearcher`]; readers never take the writer lock, so a query-only
//! process can open an index that a running daemon is writing to.
//!
//! [`SearchIndexer`]: crate::SearchIndexer
//! [`EventSearcher`]: crate::EventSearcher

use std::path::{Path, PathBuf};

use tantivy::directory::MmapDirectory;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyError};
use tracing::{debug, info};

use crate::error::SearchError;
use crate::schema::{build_event_schema, SearchSchema};

/// Where the index lives and how much memory its writer may use.
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    pub index_path: PathBuf,
    pub writer_memory_mb: usize,
}

impl SearchIndexConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            writer_memory_mb: 50,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }
}

/// Handle to the event index.
pub struct SearchIndex {
    index: Index,
    schema: SearchSchema,
    writer_memory_bytes: usize,
}

impl SearchIndex {
    /// Open the index under `config.index_path`, creating it if missing.
    ///
    /// An existing index built with a different schema is refused.
    pub fn open_or_create(config: SearchIndexConfig) -> Result<Self, SearchError> {
        let index = open_or_create_index(&config.index_path)?;
        let schema = SearchSchema::from_schema(index.schema())?;

        info!(path = ?config.index_path, "Opened event index");

        Ok(Self {
            index,
            schema,
            writer_memory_bytes: config.writer_memory_mb * 1024 * 1024,
        })
    }

    pub fn schema(&self) -> &SearchSchema {
        &self.schema
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Take the single writer of this index.
    ///
    /// Fails with a lock error while another writer is alive, in this
    /// process or another.
    pub fn writer(&self) -> Result<IndexWriter, SearchError> {
        let writer = self.index.writer(self.writer_memory_bytes)?;
        debug!(memory_bytes = self.writer_memory_bytes, "Acquired index writer");
        Ok(writer)
    }

    /// Reader pinned to the latest commit. Reload it to see later commits.
    pub fn reader(&self) -> Result<IndexReader, SearchError> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(reader)
    }
}

/// Open or create an event index in `path`.
fn open_or_create_index(path: &Path) -> Result<Index, SearchError> {
    std::fs::create_dir_all(path)?;
    let directory = MmapDirectory::open(path).map_err(|e| SearchError::Tantivy(e.into()))?;

    Index::open_or_create(directory, build_event_schema().schema().clone()).map_err(|e| match e {
        TantivyError::SchemaError(message) => SearchError::SchemaMismatch(message),
        other => SearchError::Tantivy(other),
    })
}

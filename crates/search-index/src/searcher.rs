//! Query execution over indexed events.
//!
//! Hits carry the terms matched in each content field so callers can build
//! highlight sets without re-tokenizing documents.

use std::collections::HashMap;

use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, Occur, Query, QueryClone, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::snippet::SnippetGenerator;
use tantivy::{Index, IndexReader, TantivyDocument, Term};
use tracing::{debug, info, warn};

use search_types::{ContentField, IndexKey};

use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::SearchSchema;

/// Largest `offset + limit` a query may ask the collector for.
///
/// Tantivy sizes its top-N heap up front, so this bounds allocation per query.
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// A query against the event index.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Query string in Tantivy query syntax
    pub search_term: String,
    /// Content fields to search and highlight (empty = body, name, topic)
    pub fields: Vec<ContentField>,
    /// Restrict hits to these rooms (empty = all rooms)
    pub room_ids: Vec<String>,
    /// Maximum hits to return
    pub limit: usize,
    /// Hits to skip before collecting
    pub offset: usize,
}

impl SearchRequest {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            fields: Vec::new(),
            room_ids: Vec::new(),
            limit: 10,
            offset: 0,
        }
    }

    pub fn with_fields(mut self, fields: Vec<ContentField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_rooms(mut self, room_ids: Vec<String>) -> Self {
        self.room_ids = room_ids;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Number of top documents the collector must rank, if it fits.
    pub fn result_window(&self) -> Option<usize> {
        self.offset
            .checked_add(self.limit)
            .filter(|window| *window <= MAX_RESULT_WINDOW)
    }

    /// Fields actually searched.
    pub fn effective_fields(&self) -> Vec<ContentField> {
        if self.fields.is_empty() {
            ContentField::DEFAULT_SEARCH.to_vec()
        } else {
            self.fields.clone()
        }
    }
}

/// One scored document.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub key: IndexKey,
    pub score: f32,
    /// Matched surface terms per content field
    pub locations: HashMap<ContentField, Vec<String>>,
}

impl SearchHit {
    pub fn room_id(&self) -> &str {
        self.key.room_id()
    }

    pub fn event_id(&self) -> &str {
        self.key.event_id()
    }
}

/// Ordered hits plus the total number of matching documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryHits {
    pub hits: Vec<SearchHit>,
    pub total: u64,
}

/// Searcher over the event index using BM25 ranking.
pub struct EventSearcher {
    index: Index,
    reader: IndexReader,
    schema: SearchSchema,
}

impl EventSearcher {
    /// Create a new searcher from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        Ok(Self {
            index: index.index().clone(),
            reader: index.reader()?,
            schema: index.schema().clone(),
        })
    }

    /// Reload the reader to see recent commits.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        debug!("Reloaded search reader");
        Ok(())
    }

    /// Run a query, returning scored hits with matched terms.
    pub fn search(&self, request: &SearchRequest) -> Result<QueryHits, SearchError> {
        if request.result_window().is_none() {
            return Err(SearchError::InvalidRequest(format!(
                "offset {} + limit {} exceeds the result window of {}",
                request.offset, request.limit, MAX_RESULT_WINDOW
            )));
        }
        if request.search_term.trim().is_empty() || request.limit == 0 {
            return Ok(QueryHits::default());
        }

        let fields = request.effective_fields();
        let tantivy_fields: Vec<Field> = fields
            .iter()
            .map(|field| self.schema.content_field(*field))
            .collect();

        let query_parser = QueryParser::for_index(&self.index, tantivy_fields);
        let text_query = query_parser.parse_query(&request.search_term)?;

        let final_query: Box<dyn Query> = if request.room_ids.is_empty() {
            text_query.box_clone()
        } else {
            let room_clauses: Vec<(Occur, Box<dyn Query>)> = request
                .room_ids
                .iter()
                .map(|room_id| {
                    let term = Term::from_field_text(self.schema.room_id, room_id);
                    let query: Box<dyn Query> =
                        Box::new(TermQuery::new(term, IndexRecordOption::Basic));
                    (Occur::Should, query)
                })
                .collect();

            Box::new(BooleanQuery::new(vec![
                (Occur::Must, text_query.box_clone()),
                (Occur::Must, Box::new(BooleanQuery::new(room_clauses))),
            ]))
        };

        let searcher = self.reader.searcher();
        let collector = (
            TopDocs::with_limit(request.limit).and_offset(request.offset),
            Count,
        );
        let (top_docs, total) = searcher.search(&*final_query, &collector)?;

        let mut generators = Vec::with_capacity(fields.len());
        for field in &fields {
            let tantivy_field = self.schema.content_field(*field);
            let generator = SnippetGenerator::create(&searcher, &*text_query, tantivy_field)?;
            generators.push((*field, tantivy_field, generator));
        }

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;

            let raw_key = doc
                .get_first(self.schema.key)
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let key = match IndexKey::parse(raw_key) {
                Ok(key) => key,
                Err(e) => {
                    warn!(error = %e, "Skipping document with malformed key");
                    continue;
                }
            };

            let mut locations = HashMap::new();
            for (field, tantivy_field, generator) in generators.iter_mut() {
                let text_len = doc
                    .get_first(*tantivy_field)
                    .and_then(|v| v.as_str())
                    .map_or(0, str::len);
                if text_len == 0 {
                    continue;
                }
                // One fragment spanning the whole field, so every match is reported.
                generator.set_max_num_chars(text_len + 1);
                let snippet = generator.snippet_from_doc(&doc);
                let fragment = snippet.fragment();
                let terms: Vec<String> = snippet
                    .highlighted()
                    .iter()
                    .filter_map(|range| fragment.get(range.clone()))
                    .map(str::to_string)
                    .collect();
                if !terms.is_empty() {
                    locations.insert(*field, terms);
                }
            }

            hits.push(SearchHit {
                key,
                score,
                locations,
            });
        }

        info!(
            query = %request.search_term,
            results = hits.len(),
            total,
            "Event search complete"
        );

        Ok(QueryHits {
            hits,
            total: total as u64,
        })
    }

    /// Whether a document is stored under `key`.
    pub fn contains(&self, key: &IndexKey) -> Result<bool, SearchError> {
        let term = Term::from_field_text(self.schema.key, key.as_str());
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let count = self.reader.searcher().search(&query, &Count)?;
        Ok(count > 0)
    }

    /// Get the number of indexed documents.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

//! Query response assembly.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use search_index::{QueryHits, SearchHit};
use search_types::ContentField;

/// One hit as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRow {
    pub room_id: String,
    pub event_id: String,
    pub score: f64,
    /// Unique matched terms across the requested fields
    pub highlights: BTreeSet<String>,
}

/// Ordered rows plus the number of matches overall.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub rows: Vec<ResponseRow>,
    pub total: u64,
}

impl QueryResponse {
    /// Build a response from engine hits, keeping the engine's order.
    pub fn from_hits(hits: &QueryHits, fields: &[ContentField]) -> Self {
        let rows = hits
            .hits
            .iter()
            .map(|hit| ResponseRow {
                room_id: hit.room_id().to_string(),
                event_id: hit.event_id().to_string(),
                score: f64::from(hit.score),
                highlights: calculate_highlights(hit, fields),
            })
            .collect();

        Self {
            rows,
            total: hits.total,
        }
    }
}

/// Collect the terms a hit matched in `fields`, deduplicated.
pub fn calculate_highlights(hit: &SearchHit, fields: &[ContentField]) -> BTreeSet<String> {
    fields
        .iter()
        .filter_map(|field| hit.locations.get(field))
        .flatten()
        .cloned()
        .collect()
}

//! Query and context entry points used by the HTTP surface.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use search_client::MatrixClient;
use search_index::{IndexEngine, SearchRequest, MAX_RESULT_WINDOW};
use search_types::{ContentField, EventTuple, ResolvedEvent};

use crate::error::BridgeError;
use crate::response::QueryResponse;

/// Most rows a single query returns.
pub const MAX_QUERY_LIMIT: usize = 100;

/// Most events fetched on either side of a context target.
pub const MAX_CONTEXT_LIMIT: usize = 100;

/// Search query as sent by callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub search_term: String,
    /// Content field names to search (empty = body, name, topic)
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub room_ids: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl QueryRequest {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            ..Default::default()
        }
    }

    /// Translate into an engine request, rejecting unknown field names.
    ///
    /// The limit is capped at [`MAX_QUERY_LIMIT`]; an offset that pushes the
    /// page past [`MAX_RESULT_WINDOW`] is refused.
    pub fn to_search_request(&self, default_limit: usize) -> Result<SearchRequest, BridgeError> {
        let fields = self
            .keys
            .iter()
            .map(|key| key.parse::<ContentField>().map_err(BridgeError::InvalidRequest))
            .collect::<Result<Vec<_>, _>>()?;

        let limit = self.limit.unwrap_or(default_limit).min(MAX_QUERY_LIMIT);
        match self.offset.checked_add(limit) {
            Some(window) if window <= MAX_RESULT_WINDOW => {}
            _ => {
                return Err(BridgeError::InvalidRequest(format!(
                    "offset {} is past the last reachable result ({})",
                    self.offset, MAX_RESULT_WINDOW
                )))
            }
        }

        Ok(SearchRequest::new(self.search_term.clone())
            .with_fields(fields)
            .with_rooms(self.room_ids.clone())
            .with_limit(limit)
            .with_offset(self.offset))
    }
}

/// Context lookup for a set of events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRequest {
    pub events: Vec<EventTuple>,
    #[serde(default)]
    pub before_limit: usize,
    #[serde(default)]
    pub after_limit: usize,
    /// Report per-event failures instead of failing the whole request
    #[serde(default)]
    pub partial: bool,
}

/// Resolution result for one requested tuple.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResult {
    pub room_id: String,
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextResponse {
    pub results: Vec<ContextResult>,
}

/// Search and context resolution over an injected engine and client.
#[derive(Clone)]
pub struct SearchService {
    engine: Arc<dyn IndexEngine>,
    client: MatrixClient,
    default_limit: usize,
}

impl SearchService {
    pub fn new(engine: Arc<dyn IndexEngine>, client: MatrixClient, default_limit: usize) -> Self {
        Self {
            engine,
            client,
            default_limit,
        }
    }

    pub fn client(&self) -> &MatrixClient {
        &self.client
    }

    /// Run a query against the index. Blocks on the engine.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryResponse, BridgeError> {
        let search_request = request.to_search_request(self.default_limit)?;
        let hits = self.engine.query(&search_request)?;
        let response = QueryResponse::from_hits(&hits, &search_request.effective_fields());
        debug!(
            rows = response.rows.len(),
            total = response.total,
            "Assembled query response"
        );
        Ok(response)
    }

    /// Resolve the context of each requested event.
    ///
    /// Without `partial` the first homeserver error fails the call. Both
    /// window sides are capped at [`MAX_CONTEXT_LIMIT`].
    pub async fn resolve_context(&self, request: &ContextRequest) -> Result<ContextResponse, BridgeError> {
        let before = request.before_limit.min(MAX_CONTEXT_LIMIT);
        let after = request.after_limit.min(MAX_CONTEXT_LIMIT);
        info!(
            events = request.events.len(),
            before,
            after,
            partial = request.partial,
            "Resolving context"
        );

        let results = if request.partial {
            self.client
                .mass_resolve_event_context_settled(&request.events, before, after)
                .await
                .into_iter()
                .map(|outcome| {
                    let (resolved, error) = match outcome.result {
                        Ok(resolved) => (Some(resolved), None),
                        Err(e) => (None, Some(e.to_string())),
                    };
                    ContextResult {
                        room_id: outcome.tuple.room_id,
                        event_id: outcome.tuple.event_id,
                        resolved,
                        error,
                    }
                })
                .collect()
        } else {
            let resolved = self
                .client
                .mass_resolve_event_context(&request.events, before, after)
                .await?;
            request
                .events
                .iter()
                .zip(resolved)
                .map(|(tuple, resolved)| ContextResult {
                    room_id: tuple.room_id.clone(),
                    event_id: tuple.event_id.clone(),
                    resolved: Some(resolved),
                    error: None,
                })
                .collect()
        };

        Ok(ContextResponse { results })
    }
}

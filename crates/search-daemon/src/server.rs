//! HTTP surface of the daemon.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `PUT`  | `/transactions/{txn_id}` | Appservice event push (legacy path) |
//! | `PUT`  | `/_matrix/app/v1/transactions/{txn_id}` | Appservice event push |
//! | `POST` | `/api/enqueue` | Index a JSON array of events |
//! | `POST` | `/api/query` | Search the index |
//! | `POST` | `/api/context` | Resolve event context from the homeserver |
//! | `GET`  | `/health` | Health check |
//!
//! Errors use the homeserver error shape: `{"errcode": ..., "error": ...}`.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use search_bridge::{
    BatchReport, BridgeError, ContextRequest, ContextResponse, IndexingPipeline, QueryRequest,
    QueryResponse, SearchService,
};
use search_index::SearchError;
use search_types::ChatEvent;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<IndexingPipeline>,
    service: SearchService,
    /// Token the homeserver must present on transaction pushes
    hs_token: Option<Arc<SecretString>>,
}

impl AppState {
    pub fn new(pipeline: Arc<IndexingPipeline>, service: SearchService) -> Self {
        Self {
            pipeline,
            service,
            hs_token: None,
        }
    }

    pub fn with_hs_token(mut self, token: Option<String>) -> Self {
        self.hs_token = token.map(|t| Arc::new(SecretString::from(t)));
        self
    }

    /// Whether `presented` is acceptable for transaction pushes.
    fn authorizes(&self, presented: Option<&str>) -> bool {
        match &self.hs_token {
            None => true,
            Some(expected) => presented == Some(expected.expose_secret()),
        }
    }
}

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/transactions/{txn_id}", put(handle_transaction))
        .route("/_matrix/app/v1/transactions/{txn_id}", put(handle_transaction))
        .route("/api/enqueue", post(handle_enqueue))
        .route("/api/query", post(handle_query))
        .route("/api/context", post(handle_context))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn run_server_with_shutdown<F>(
    addr: SocketAddr,
    state: AppState,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("HTTP server shutdown complete");
    Ok(())
}

// ============ Errors ============

/// Error reply in homeserver shape.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    errcode: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, errcode: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            errcode,
            message: message.into(),
        }
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "M_FORBIDDEN", "Bad token supplied")
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "M_UNKNOWN", message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({"errcode": self.errcode, "error": self.message});
        (self.status, Json(body)).into_response()
    }
}

impl From<BridgeError> for AppError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::InvalidRequest(message) => {
                AppError::new(StatusCode::BAD_REQUEST, "M_BAD_JSON", message)
            }
            BridgeError::Search(e @ (SearchError::QueryParse(_) | SearchError::InvalidRequest(_))) => {
                AppError::new(StatusCode::BAD_REQUEST, "M_BAD_JSON", e.to_string())
            }
            BridgeError::Search(e) => AppError::internal(e.to_string()),
            BridgeError::Client(e) => AppError::new(StatusCode::BAD_GATEWAY, "M_UNKNOWN", e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!(error = %err, "Blocking task failed");
        AppError::internal("Background task failed")
    }
}

// ============ Handlers ============

#[derive(Debug, Deserialize)]
struct Transaction {
    #[serde(default)]
    events: Vec<ChatEvent>,
}

/// Token from `?access_token=` or an `Authorization: Bearer` header.
fn presented_token<'a>(params: &'a HashMap<String, String>, headers: &'a HeaderMap) -> Option<&'a str> {
    params.get("access_token").map(String::as_str).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    })
}

async fn run_batch(pipeline: Arc<IndexingPipeline>, events: Vec<ChatEvent>) -> Result<BatchReport, AppError> {
    Ok(tokio::task::spawn_blocking(move || pipeline.process_batch(&events)).await?)
}

async fn handle_transaction(
    State(state): State<AppState>,
    Path(txn_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(transaction): Json<Transaction>,
) -> Result<Json<Value>, AppError> {
    if !state.authorizes(presented_token(&params, &headers)) {
        warn!(txn_id = %txn_id, "Rejected transaction with bad token");
        return Err(AppError::forbidden());
    }

    info!(txn_id = %txn_id, events = transaction.events.len(), "Received transaction");
    let report = run_batch(state.pipeline.clone(), transaction.events).await?;
    if report.failed > 0 {
        warn!(txn_id = %txn_id, failed = report.failed, "Transaction had failed events");
    }
    Ok(Json(json!({})))
}

async fn handle_enqueue(
    State(state): State<AppState>,
    Json(events): Json<Vec<ChatEvent>>,
) -> Result<Json<BatchReport>, AppError> {
    let report = run_batch(state.pipeline.clone(), events).await?;
    Ok(Json(report))
}

async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let service = state.service.clone();
    let response = tokio::task::spawn_blocking(move || service.query(&request)).await??;
    Ok(Json(response))
}

async fn handle_context(
    State(state): State<AppState>,
    Json(request): Json<ContextRequest>,
) -> Result<Json<ContextResponse>, AppError> {
    let response = state.service.resolve_context(&request).await?;
    Ok(Json(response))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presented_token_prefers_query() {
        let mut params = HashMap::new();
        params.insert("access_token".to_string(), "from-query".to_string());
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());

        assert_eq!(presented_token(&params, &headers), Some("from-query"));
        assert_eq!(presented_token(&HashMap::new(), &headers), Some("from-header"));
        assert_eq!(presented_token(&HashMap::new(), &HeaderMap::new()), None);
    }

    #[test]
    fn test_bridge_errors_map_to_status() {
        let err: AppError = BridgeError::InvalidRequest("bad".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: AppError = BridgeError::Search(SearchError::InvalidRequest("window".to_string())).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: AppError = BridgeError::Client(search_client::ClientError::NotFound("$e".to_string())).into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }
}

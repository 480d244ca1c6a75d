//! In-memory transport for tests.
//!
//! Responses are registered per path; requests are recorded in order so
//! tests can assert on round-trips. Unregistered paths answer 404.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;
use crate::transport::Transport;

#[derive(Debug, Clone)]
enum Canned {
    Json(Value),
    Error { status: u16, errcode: String },
}

/// A request seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

/// Transport answering from a fixed table.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: HashMap<String, Canned>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `path` with a JSON body.
    pub fn with_response(mut self, path: &[&str], body: Value) -> Self {
        self.responses.insert(path.join("/"), Canned::Json(body));
        self
    }

    /// Answer `path` with a homeserver error.
    pub fn with_error(mut self, path: &[&str], status: u16, errcode: &str) -> Self {
        self.responses.insert(
            path.join("/"),
            Canned::Error {
                status,
                errcode: errcode.to_string(),
            },
        );
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &[&str], query: &[(&str, String)]) -> Result<Value, ClientError> {
        let path = path.join("/");
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                path: path.clone(),
                query: query
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect(),
            });
        }

        match self.responses.get(&path) {
            Some(Canned::Json(body)) => Ok(body.clone()),
            Some(Canned::Error { status, errcode }) => {
                let body = serde_json::json!({"errcode": errcode, "error": path});
                Err(ClientError::from_status(*status, body.to_string().as_bytes()))
            }
            None => Err(ClientError::NotFound(path)),
        }
    }
}

//! Transport to the homeserver client API.
//!
//! The bridge only issues GET requests addressed by path segments plus
//! optional query parameters. [`HttpTransport`] performs them over reqwest;
//! retries, if any, belong here and not in the callers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::error::ClientError;

/// Path prefix of the client-server API.
const CLIENT_API_PREFIX: [&str; 3] = ["_matrix", "client", "r0"];

/// A GET-only JSON transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `{prefix}/{path...}?{query}` and decode the body as JSON.
    async fn get(&self, path: &[&str], query: &[(&str, String)]) -> Result<Value, ClientError>;
}

/// Configuration for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportConfig {
    /// Homeserver base URL (e.g. "https://matrix.example.org")
    pub homeserver_url: String,

    /// Bearer token sent with every request
    pub access_token: Option<SecretString>,

    /// Request timeout
    pub timeout: Duration,

    /// Skip TLS certificate verification. Off unless explicitly set.
    pub accept_invalid_certs: bool,
}

impl HttpTransportConfig {
    pub fn new(homeserver_url: impl Into<String>) -> Self {
        Self {
            homeserver_url: homeserver_url.into(),
            access_token: None,
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    access_token: Option<SecretString>,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.homeserver_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.homeserver_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.homeserver_url));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            access_token: config.access_token,
        })
    }

    /// Build the full request URL. Path segments are percent-encoded.
    pub fn build_url(&self, path: &[&str], query: &[(&str, String)]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(CLIENT_API_PREFIX)
            .extend(path);

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &[&str], query: &[(&str, String)]) -> Result<Value, ClientError> {
        let url = self.build_url(path, query)?;
        debug!(path = %url.path(), "GET homeserver");

        let mut request = self.client.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ClientError::from_status(status.as_u16(), &body));
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_segments() {
        let transport = HttpTransport::new(HttpTransportConfig::new("https://hs.example.org")).unwrap();
        let url = transport
            .build_url(&["rooms", "!room:example.org", "event", "$ev/1"], &[])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://hs.example.org/_matrix/client/r0/rooms/!room:example.org/event/$ev%2F1"
        );
    }

    #[test]
    fn test_build_url_with_query_and_base_path() {
        let transport =
            HttpTransport::new(HttpTransportConfig::new("https://hs.example.org/proxy/")).unwrap();
        let url = transport
            .build_url(&["rooms", "!r:x", "context", "$e"], &[("limit", "6".to_string())])
            .unwrap();

        assert_eq!(url.path(), "/proxy/_matrix/client/r0/rooms/!r:x/context/$e");
        assert_eq!(url.query(), Some("limit=6"));
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(HttpTransport::new(HttpTransportConfig::new("not a url")).is_err());
        assert!(HttpTransport::new(HttpTransportConfig::new("mailto:someone@example.org")).is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = HttpTransportConfig::new("https://hs.example.org")
            .with_access_token("secret")
            .with_timeout(Duration::from_secs(5))
            .with_accept_invalid_certs(true);

        assert!(config.access_token.is_some());
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.accept_invalid_certs);
        assert!(!format!("{:?}", config).contains("secret"));
    }
}

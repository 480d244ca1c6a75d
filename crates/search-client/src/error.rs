//! Error types for the homeserver client.

use thiserror::Error;

/// Errors that can occur when talking to the homeserver.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network or protocol failure before a response was read
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The homeserver does not know the requested resource (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The homeserver refused access (403), e.g. history visibility
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Any other non-2xx reply
    #[error("Homeserver returned {status}: {errcode} {message}")]
    Status {
        status: u16,
        errcode: String,
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The homeserver URL cannot carry path segments
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP client could not be built
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Build the error for a non-2xx status and its body.
    ///
    /// Homeserver errors carry `{"errcode": ..., "error": ...}`; other
    /// bodies are kept verbatim as the message.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            #[serde(default)]
            errcode: String,
            #[serde(default)]
            error: String,
        }

        let (errcode, message) = match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => (parsed.errcode, parsed.error),
            Err(_) => (String::new(), String::from_utf8_lossy(body).into_owned()),
        };

        match status {
            404 => ClientError::NotFound(message),
            403 => ClientError::Forbidden(message),
            _ => ClientError::Status {
                status,
                errcode,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_known_codes() {
        let body = br#"{"errcode":"M_NOT_FOUND","error":"Event not found"}"#;
        assert!(matches!(
            ClientError::from_status(404, body),
            ClientError::NotFound(m) if m == "Event not found"
        ));

        let body = br#"{"errcode":"M_FORBIDDEN","error":"not allowed"}"#;
        assert!(matches!(ClientError::from_status(403, body), ClientError::Forbidden(_)));
    }

    #[test]
    fn test_from_status_non_json_body() {
        let err = ClientError::from_status(502, b"Bad Gateway");
        match err {
            ClientError::Status {
                status, message, ..
            } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Composite document keys.
//!
//! Every indexed event is stored under `room_id/event_id`. The same key is
//! rebuilt from a redaction's target to delete the original document.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Separator between the room and event portions of a key.
pub const KEY_SEPARATOR: char = '/';

/// Handle of one document in the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexKey(String);

impl IndexKey {
    /// Join a room id and an event id.
    pub fn new(room_id: &str, event_id: &str) -> Self {
        Self(format!("{}{}{}", room_id, KEY_SEPARATOR, event_id))
    }

    /// Parse a stored key, requiring a separator to be present.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        if raw.contains(KEY_SEPARATOR) {
            Ok(Self(raw.to_string()))
        } else {
            Err(TypesError::InvalidKey(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into `(room_id, event_id)` on the first separator.
    ///
    /// Separators inside the event id are kept in the event portion.
    pub fn split(&self) -> (&str, &str) {
        self.0
            .split_once(KEY_SEPARATOR)
            .unwrap_or((self.0.as_str(), ""))
    }

    pub fn room_id(&self) -> &str {
        self.split().0
    }

    pub fn event_id(&self) -> &str {
        self.split().1
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IndexKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_split() {
        let key = IndexKey::new("!room:example.org", "$event1");
        assert_eq!(key.as_str(), "!room:example.org/$event1");
        assert_eq!(key.split(), ("!room:example.org", "$event1"));
    }

    #[test]
    fn test_separator_inside_event_id() {
        let key = IndexKey::new("!room:example.org", "$abc/def/ghi");
        assert_eq!(key.room_id(), "!room:example.org");
        assert_eq!(key.event_id(), "$abc/def/ghi");
    }

    #[test]
    fn test_parse() {
        let key = IndexKey::parse("!a:b/$c").unwrap();
        assert_eq!(key.split(), ("!a:b", "$c"));
        assert!(IndexKey::parse("no-separator").is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = IndexKey::new("!a:b", "$c");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"!a:b/$c\"");
    }
}

//! Chat events as delivered by the homeserver.
//!
//! Only the fields the bridge reads are modelled. Everything else in the
//! wire object is ignored on decode.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::key::IndexKey;

/// Event type of a redaction.
pub const REDACTION_EVENT_TYPE: &str = "m.room.redaction";

/// Whether an event is a timeline message or a piece of room state.
///
/// Decided once when the event is decoded; the state key only exists on
/// the `State` variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Message,
    State { state_key: String },
}

/// A chat event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEvent", into = "RawEvent")]
pub struct ChatEvent {
    pub sender: String,
    pub room_id: String,
    pub event_id: String,
    pub event_type: String,
    pub content: Map<String, Value>,
    /// Milliseconds since the Unix epoch, as set by the origin server
    pub timestamp_ms: i64,
    /// Event id this event redacts, if it is a redaction
    pub redacts: Option<String>,
    pub kind: EventKind,
}

impl ChatEvent {
    /// Create a message event with empty content.
    pub fn message(
        room_id: impl Into<String>,
        event_id: impl Into<String>,
        sender: impl Into<String>,
        event_type: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            sender: sender.into(),
            room_id: room_id.into(),
            event_id: event_id.into(),
            event_type: event_type.into(),
            content: Map::new(),
            timestamp_ms,
            redacts: None,
            kind: EventKind::Message,
        }
    }

    /// Set a string content field.
    pub fn with_content(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.content.insert(key.to_string(), value.into());
        self
    }

    /// Turn this event into a redaction of `target`.
    pub fn with_redacts(mut self, target: impl Into<String>) -> Self {
        self.redacts = Some(target.into());
        self
    }

    /// Turn this event into a state event.
    pub fn with_state_key(mut self, state_key: impl Into<String>) -> Self {
        self.kind = EventKind::State {
            state_key: state_key.into(),
        };
        self
    }

    /// The redaction target, if present and non-empty.
    pub fn redaction_target(&self) -> Option<&str> {
        self.redacts.as_deref().filter(|target| !target.is_empty())
    }

    pub fn is_redaction(&self) -> bool {
        self.redaction_target().is_some()
    }

    pub fn is_state_event(&self) -> bool {
        matches!(self.kind, EventKind::State { .. })
    }

    pub fn state_key(&self) -> Option<&str> {
        match &self.kind {
            EventKind::State { state_key } => Some(state_key),
            EventKind::Message => None,
        }
    }

    /// String value of a content field, ignoring non-string values.
    pub fn content_str(&self, key: &str) -> Option<&str> {
        self.content.get(key).and_then(Value::as_str)
    }

    /// Key of this event's own document.
    pub fn index_key(&self) -> IndexKey {
        IndexKey::new(&self.room_id, &self.event_id)
    }

    /// Key of the document this event redacts.
    pub fn redaction_key(&self) -> Option<IndexKey> {
        self.redaction_target()
            .map(|target| IndexKey::new(&self.room_id, target))
    }
}

/// Wire shape of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawEvent {
    #[serde(default)]
    sender: String,
    #[serde(default)]
    room_id: String,
    #[serde(default)]
    event_id: String,
    #[serde(rename = "type", default)]
    event_type: String,
    #[serde(default)]
    content: Map<String, Value>,
    #[serde(default)]
    origin_server_ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    redacts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state_key: Option<String>,
}

impl From<RawEvent> for ChatEvent {
    fn from(raw: RawEvent) -> Self {
        // Newer room versions carry the target inside the content.
        let redacts = raw.redacts.or_else(|| {
            raw.content
                .get("redacts")
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        let kind = match raw.state_key {
            Some(state_key) => EventKind::State { state_key },
            None => EventKind::Message,
        };

        Self {
            sender: raw.sender,
            room_id: raw.room_id,
            event_id: raw.event_id,
            event_type: raw.event_type,
            content: raw.content,
            timestamp_ms: raw.origin_server_ts,
            redacts,
            kind,
        }
    }
}

impl From<ChatEvent> for RawEvent {
    fn from(event: ChatEvent) -> Self {
        let state_key = match event.kind {
            EventKind::State { state_key } => Some(state_key),
            EventKind::Message => None,
        };

        Self {
            sender: event.sender,
            room_id: event.room_id,
            event_id: event.event_id,
            event_type: event.event_type,
            content: event.content,
            origin_server_ts: event.timestamp_ms,
            redacts: event.redacts,
            state_key,
        }
    }
}

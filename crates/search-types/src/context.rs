//! Resolved surroundings of search hits.

use serde::{Deserialize, Serialize};

use crate::event::ChatEvent;

/// A (room, event) reference to resolve against the homeserver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTuple {
    pub room_id: String,
    pub event_id: String,
}

impl EventTuple {
    pub fn new(room_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            event_id: event_id.into(),
        }
    }
}

/// Events around a resolved event, plus the room state at that point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub start: String,
    pub end: String,
    /// Events strictly before, in origin order
    pub events_before: Vec<ChatEvent>,
    /// Events strictly after, in origin order
    pub events_after: Vec<ChatEvent>,
    pub state: Vec<ChatEvent>,
}

/// Result of resolving one tuple, with or without context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub event: ChatEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

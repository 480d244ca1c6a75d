//! Typed homeserver operations.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use search_types::{ChatEvent, Context, ResolvedEvent};

use crate::error::ClientError;
use crate::transport::{HttpTransport, HttpTransportConfig, Transport};

#[derive(Deserialize)]
struct RespWhoami {
    user_id: String,
}

#[derive(Deserialize)]
struct RespJoinedRooms {
    #[serde(default)]
    joined_rooms: Vec<String>,
}

#[derive(Deserialize)]
struct RespContext {
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
    #[serde(default)]
    events_before: Vec<ChatEvent>,
    event: ChatEvent,
    #[serde(default)]
    events_after: Vec<ChatEvent>,
    #[serde(default)]
    state: Vec<ChatEvent>,
}

/// Homeserver client shared across handlers. Cloning is cheap.
#[derive(Clone)]
pub struct MatrixClient {
    transport: Arc<dyn Transport>,
}

impl MatrixClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Build a client over [`HttpTransport`].
    pub fn from_config(config: HttpTransportConfig) -> Result<Self, ClientError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let value = self.transport.get(path, query).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// User id the access token belongs to.
    pub async fn whoami(&self) -> Result<String, ClientError> {
        let resp: RespWhoami = self.get_json(&["account", "whoami"], &[]).await?;
        Ok(resp.user_id)
    }

    /// Rooms the account has joined.
    pub async fn joined_rooms(&self) -> Result<Vec<String>, ClientError> {
        let resp: RespJoinedRooms = self.get_json(&["joined_rooms"], &[]).await?;
        Ok(resp.joined_rooms)
    }

    /// Current state events of a room.
    pub async fn latest_state(&self, room_id: &str) -> Result<Vec<ChatEvent>, ClientError> {
        let mut events: Vec<ChatEvent> = self.get_json(&["rooms", room_id, "state"], &[]).await?;
        fill_room_id(&mut events, room_id);
        Ok(events)
    }

    /// Fetch a single event.
    pub async fn resolve_event(&self, room_id: &str, event_id: &str) -> Result<ChatEvent, ClientError> {
        let mut event: ChatEvent = self
            .get_json(&["rooms", room_id, "event", event_id], &[])
            .await?;
        if event.room_id.is_empty() {
            event.room_id = room_id.to_string();
        }
        Ok(event)
    }

    /// Fetch an event with up to `before_limit` preceding and `after_limit`
    /// following events, plus the room state at that point.
    ///
    /// The context endpoint takes a single symmetric limit, so the window
    /// is over-fetched with `max(before, after) + 1` and cut down locally.
    pub async fn resolve_event_context(
        &self,
        room_id: &str,
        event_id: &str,
        before_limit: usize,
        after_limit: usize,
    ) -> Result<ResolvedEvent, ClientError> {
        let limit = before_limit.max(after_limit).saturating_add(1);

        let resp: RespContext = self
            .get_json(
                &["rooms", room_id, "context", event_id],
                &[("limit", limit.to_string())],
            )
            .await?;

        let RespContext {
            start,
            end,
            mut events_before,
            mut event,
            mut events_after,
            mut state,
        } = resp;

        debug!(
            room_id,
            event_id,
            limit,
            before = events_before.len(),
            after = events_after.len(),
            "Fetched event context"
        );

        events_before.truncate(before_limit);
        events_after.truncate(after_limit);

        if event.room_id.is_empty() {
            event.room_id = room_id.to_string();
        }
        fill_room_id(&mut events_before, room_id);
        fill_room_id(&mut events_after, room_id);
        fill_room_id(&mut state, room_id);

        Ok(ResolvedEvent {
            event,
            context: Some(Context {
                start,
                end,
                events_before,
                events_after,
                state,
            }),
        })
    }
}

/// Events served under a room path may omit their room id.
fn fill_room_id(events: &mut [ChatEvent], room_id: &str) {
    for event in events.iter_mut().filter(|e| e.room_id.is_empty()) {
        event.room_id = room_id.to_string();
    }
}

//! Mass resolution of event tuples.
//!
//! Tuples are resolved one round-trip at a time, in order. The plain
//! variants are fail-fast: the first error discards everything resolved so
//! far in the call. The `_settled` variants keep going and report a result
//! per tuple, which suits history that is partly forbidden to the account.

use tracing::{debug, warn};

use search_types::{EventTuple, ResolvedEvent};

use crate::client::MatrixClient;
use crate::error::ClientError;

/// What to fetch for each tuple.
#[derive(Debug, Clone, Copy)]
enum Window {
    EventOnly,
    Context { before: usize, after: usize },
}

/// Result of resolving one tuple in a settled call.
#[derive(Debug)]
pub struct TupleOutcome {
    pub tuple: EventTuple,
    pub result: Result<ResolvedEvent, ClientError>,
}

impl TupleOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl MatrixClient {
    async fn resolve_tuple(&self, tuple: &EventTuple, window: Window) -> Result<ResolvedEvent, ClientError> {
        match window {
            Window::EventOnly => {
                let event = self.resolve_event(&tuple.room_id, &tuple.event_id).await?;
                Ok(ResolvedEvent {
                    event,
                    context: None,
                })
            }
            Window::Context { before, after } => {
                self.resolve_event_context(&tuple.room_id, &tuple.event_id, before, after)
                    .await
            }
        }
    }

    async fn resolve_all(&self, tuples: &[EventTuple], window: Window) -> Result<Vec<ResolvedEvent>, ClientError> {
        let mut resolved = Vec::with_capacity(tuples.len());
        for (position, tuple) in tuples.iter().enumerate() {
            match self.resolve_tuple(tuple, window).await {
                Ok(event) => resolved.push(event),
                Err(e) => {
                    warn!(
                        room_id = %tuple.room_id,
                        event_id = %tuple.event_id,
                        position,
                        discarded = resolved.len(),
                        error = %e,
                        "Mass resolution aborted"
                    );
                    return Err(e);
                }
            }
        }
        debug!(count = resolved.len(), "Mass resolution complete");
        Ok(resolved)
    }

    async fn resolve_settled(&self, tuples: &[EventTuple], window: Window) -> Vec<TupleOutcome> {
        let mut outcomes = Vec::with_capacity(tuples.len());
        for tuple in tuples {
            let result = self.resolve_tuple(tuple, window).await;
            if let Err(e) = &result {
                warn!(
                    room_id = %tuple.room_id,
                    event_id = %tuple.event_id,
                    error = %e,
                    "Failed to resolve tuple"
                );
            }
            outcomes.push(TupleOutcome {
                tuple: tuple.clone(),
                result,
            });
        }
        outcomes
    }

    /// Resolve the context of every tuple. Fails on the first error.
    pub async fn mass_resolve_event_context(
        &self,
        tuples: &[EventTuple],
        before_limit: usize,
        after_limit: usize,
    ) -> Result<Vec<ResolvedEvent>, ClientError> {
        let window = Window::Context {
            before: before_limit,
            after: after_limit,
        };
        self.resolve_all(tuples, window).await
    }

    /// Resolve every tuple's event. Fails on the first error.
    pub async fn mass_resolve_event(&self, tuples: &[EventTuple]) -> Result<Vec<ResolvedEvent>, ClientError> {
        self.resolve_all(tuples, Window::EventOnly).await
    }

    /// Resolve the context of every tuple, reporting each result.
    pub async fn mass_resolve_event_context_settled(
        &self,
        tuples: &[EventTuple],
        before_limit: usize,
        after_limit: usize,
    ) -> Vec<TupleOutcome> {
        let window = Window::Context {
            before: before_limit,
            after: after_limit,
        };
        self.resolve_settled(tuples, window).await
    }

    /// Resolve every tuple's event, reporting each result.
    pub async fn mass_resolve_event_settled(&self, tuples: &[EventTuple]) -> Vec<TupleOutcome> {
        self.resolve_settled(tuples, Window::EventOnly).await
    }
}

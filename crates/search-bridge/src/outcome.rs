//! Per-event results of a batch.

use serde::Serialize;

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum OutcomeKind {
    Indexed,
    Redacted,
    Skipped,
    WriteFailed(String),
    DeleteFailed(String),
}

impl OutcomeKind {
    pub fn is_failure(&self) -> bool {
        matches!(self, OutcomeKind::WriteFailed(_) | OutcomeKind::DeleteFailed(_))
    }

    /// Whether the engine holds an uncommitted change for this event.
    pub fn is_write(&self) -> bool {
        matches!(self, OutcomeKind::Indexed | OutcomeKind::Redacted)
    }
}

/// Outcome for one event, addressed by its own ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    pub room_id: String,
    pub event_id: String,
    #[serde(flatten)]
    pub kind: OutcomeKind,
}

/// Outcomes of a batch in received order, plus counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<EventOutcome>,
    pub indexed: usize,
    pub redacted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Whether pending writes were committed after the batch
    pub committed: bool,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome and bump its counter.
    pub fn record(&mut self, room_id: &str, event_id: &str, kind: OutcomeKind) {
        match &kind {
            OutcomeKind::Indexed => self.indexed += 1,
            OutcomeKind::Redacted => self.redacted += 1,
            OutcomeKind::Skipped => self.skipped += 1,
            OutcomeKind::WriteFailed(_) | OutcomeKind::DeleteFailed(_) => self.failed += 1,
        }
        self.outcomes.push(EventOutcome {
            room_id: room_id.to_string(),
            event_id: event_id.to_string(),
            kind,
        });
    }

    pub fn has_writes(&self) -> bool {
        self.indexed + self.redacted > 0
    }

    /// Events handled, whatever the outcome.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &EventOutcome> {
        self.outcomes.iter().filter(|o| o.kind.is_failure())
    }
}

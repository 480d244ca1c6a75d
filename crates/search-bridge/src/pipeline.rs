//! Indexing pipeline for incoming chat events.
//!
//! Applies batches to an [`IndexEngine`] one event at a time, in received
//! order. A failing event is recorded and the batch carries on; the engine
//! is committed once at the end if anything was written.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use search_index::IndexEngine;
use search_types::{ChatEvent, ContentField, IndexDocument};

use crate::filter::{classify, Disposition};
use crate::outcome::{BatchReport, OutcomeKind};

/// Project an event onto the document stored in the index.
///
/// Only recognized content fields with string values are kept. A timestamp
/// outside chrono's range falls back to the Unix epoch.
pub fn build_document(event: &ChatEvent) -> IndexDocument {
    let content: BTreeMap<ContentField, String> = ContentField::ALL
        .iter()
        .filter_map(|field| {
            event
                .content_str(field.as_str())
                .map(|value| (*field, value.to_string()))
        })
        .collect();

    IndexDocument {
        sender: event.sender.clone(),
        room_id: event.room_id.clone(),
        event_type: event.event_type.clone(),
        content,
        timestamp: DateTime::<Utc>::from_timestamp_millis(event.timestamp_ms).unwrap_or_default(),
    }
}

/// Applies event batches to an index engine.
pub struct IndexingPipeline {
    engine: Arc<dyn IndexEngine>,
}

impl IndexingPipeline {
    pub fn new(engine: Arc<dyn IndexEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<dyn IndexEngine> {
        &self.engine
    }

    /// Index the indexable events of a batch.
    ///
    /// Redactions are skipped here; they go through [`Self::redact_batch`].
    pub fn index_batch(&self, events: &[ChatEvent]) -> BatchReport {
        info!(batch_size = events.len(), "Received index batch");
        let mut report = BatchReport::new();
        for event in events {
            let kind = match classify(event) {
                Disposition::Index => self.index_event(event),
                Disposition::Redact => {
                    debug!(
                        room_id = %event.room_id,
                        event_id = %event.event_id,
                        "Redaction in index batch, skipping"
                    );
                    OutcomeKind::Skipped
                }
                Disposition::Discard => self.discard(event),
            };
            report.record(&event.room_id, &event.event_id, kind);
        }
        self.finish(report)
    }

    /// Remove the documents targeted by the redactions in a batch.
    pub fn redact_batch(&self, events: &[ChatEvent]) -> BatchReport {
        info!(batch_size = events.len(), "Received redact batch");
        let mut report = BatchReport::new();
        for event in events {
            let kind = if event.is_redaction() {
                self.redact_event(event)
            } else {
                debug!(
                    room_id = %event.room_id,
                    event_id = %event.event_id,
                    "Event has no redaction target, skipping"
                );
                OutcomeKind::Skipped
            };
            report.record(&event.room_id, &event.event_id, kind);
        }
        self.finish(report)
    }

    /// Route a mixed batch event by event.
    pub fn process_batch(&self, events: &[ChatEvent]) -> BatchReport {
        info!(batch_size = events.len(), "Received event batch");
        let mut report = BatchReport::new();
        for event in events {
            let kind = match classify(event) {
                Disposition::Index => self.index_event(event),
                Disposition::Redact => self.redact_event(event),
                Disposition::Discard => self.discard(event),
            };
            report.record(&event.room_id, &event.event_id, kind);
        }
        self.finish(report)
    }

    fn index_event(&self, event: &ChatEvent) -> OutcomeKind {
        let key = event.index_key();
        let document = build_document(event);
        match self.engine.index(&key, &document) {
            Ok(()) => {
                info!(
                    room_id = %event.room_id,
                    event_id = %event.event_id,
                    "Indexed event"
                );
                OutcomeKind::Indexed
            }
            Err(e) => {
                error!(
                    room_id = %event.room_id,
                    event_id = %event.event_id,
                    error = %e,
                    "Failed to index event"
                );
                OutcomeKind::WriteFailed(e.to_string())
            }
        }
    }

    fn redact_event(&self, event: &ChatEvent) -> OutcomeKind {
        let Some(key) = event.redaction_key() else {
            return OutcomeKind::Skipped;
        };
        match self.engine.delete(&key) {
            Ok(()) => {
                info!(
                    room_id = %event.room_id,
                    event_id = %event.event_id,
                    redacts = %key.event_id(),
                    "Redacted event"
                );
                OutcomeKind::Redacted
            }
            Err(e) => {
                error!(
                    room_id = %event.room_id,
                    event_id = %event.event_id,
                    redacts = %key.event_id(),
                    error = %e,
                    "Failed to redact event"
                );
                OutcomeKind::DeleteFailed(e.to_string())
            }
        }
    }

    fn discard(&self, event: &ChatEvent) -> OutcomeKind {
        debug!(
            room_id = %event.room_id,
            event_id = %event.event_id,
            event_type = %event.event_type,
            "Event has no indexable content"
        );
        OutcomeKind::Skipped
    }

    fn finish(&self, mut report: BatchReport) -> BatchReport {
        if report.has_writes() {
            match self.engine.commit() {
                Ok(()) => report.committed = true,
                Err(e) => warn!(error = %e, "Failed to commit batch"),
            }
        }
        debug!(
            indexed = report.indexed,
            redacted = report.redacted,
            skipped = report.skipped,
            failed = report.failed,
            committed = report.committed,
            "Batch complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_index::{QueryHits, SearchError, SearchRequest};
    use search_types::IndexKey;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every call; index calls listed in `fail_index_calls`
    /// (1-based) are rejected.
    #[derive(Default)]
    struct RecordingEngine {
        calls: Mutex<Vec<String>>,
        index_calls: Mutex<usize>,
        fail_index_calls: Vec<usize>,
        fail_deletes: bool,
        fail_commit: bool,
    }

    impl RecordingEngine {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl IndexEngine for RecordingEngine {
        fn index(&self, key: &IndexKey, _document: &IndexDocument) -> Result<(), SearchError> {
            let call = {
                let mut count = self.index_calls.lock().unwrap();
                *count += 1;
                *count
            };
            self.log(format!("index {key}"));
            if self.fail_index_calls.contains(&call) {
                return Err(SearchError::Rejected(format!("write {call} refused")));
            }
            Ok(())
        }

        fn delete(&self, key: &IndexKey) -> Result<(), SearchError> {
            self.log(format!("delete {key}"));
            if self.fail_deletes {
                return Err(SearchError::Rejected("delete refused".to_string()));
            }
            Ok(())
        }

        fn commit(&self) -> Result<(), SearchError> {
            self.log("commit".to_string());
            if self.fail_commit {
                return Err(SearchError::Rejected("commit refused".to_string()));
            }
            Ok(())
        }

        fn contains(&self, _key: &IndexKey) -> Result<bool, SearchError> {
            Ok(false)
        }

        fn query(&self, _request: &SearchRequest) -> Result<QueryHits, SearchError> {
            Ok(QueryHits::default())
        }
    }

    fn message(event_id: &str, body: &str) -> ChatEvent {
        ChatEvent::message("!r:x", event_id, "@a:x", "m.room.message", 1_700_000_000_000)
            .with_content("body", body)
    }

    fn redaction(event_id: &str, target: &str) -> ChatEvent {
        ChatEvent::message("!r:x", event_id, "@a:x", "m.room.redaction", 1).with_redacts(target)
    }

    fn pipeline(engine: RecordingEngine) -> (IndexingPipeline, Arc<RecordingEngine>) {
        let engine = Arc::new(engine);
        (IndexingPipeline::new(engine.clone()), engine)
    }

    #[test]
    fn test_build_document_keeps_string_fields() {
        let event = ChatEvent::message("!r:x", "$e", "@a:x", "m.room.message", 1_500)
            .with_content("body", "hello")
            .with_content("url", "mxc://x/y")
            .with_content("name", json!(7))
            .with_content("msgtype", "m.text");

        let doc = build_document(&event);
        assert_eq!(doc.field(ContentField::Body), Some("hello"));
        assert_eq!(doc.field(ContentField::Url), Some("mxc://x/y"));
        assert_eq!(doc.field(ContentField::Name), None);
        assert_eq!(doc.content.len(), 2);
        assert_eq!(doc.timestamp.timestamp_millis(), 1_500);
        assert_eq!(doc.sender, "@a:x");
    }

    #[test]
    fn test_build_document_out_of_range_timestamp() {
        let event = ChatEvent::message("!r:x", "$e", "@a:x", "m.room.message", i64::MAX)
            .with_content("body", "x");
        assert_eq!(build_document(&event).timestamp, DateTime::<Utc>::default());
    }

    #[test]
    fn test_write_failure_does_not_abort_batch() {
        let (pipeline, engine) = pipeline(RecordingEngine {
            fail_index_calls: vec![2],
            ..Default::default()
        });

        let report = pipeline.index_batch(&[message("$1", "a"), message("$2", "b"), message("$3", "c")]);

        assert_eq!(report.indexed, 2);
        assert_eq!(report.failed, 1);
        assert!(matches!(report.outcomes[1].kind, OutcomeKind::WriteFailed(_)));
        assert_eq!(report.outcomes[2].event_id, "$3");
        assert_eq!(report.outcomes[2].kind, OutcomeKind::Indexed);
        assert_eq!(
            engine.calls(),
            vec!["index !r:x/$1", "index !r:x/$2", "index !r:x/$3", "commit"]
        );
        assert!(report.committed);
    }

    #[test]
    fn test_redaction_deletes_target_key() {
        let (pipeline, engine) = pipeline(RecordingEngine::default());

        let report = pipeline.redact_batch(&[redaction("$redaction", "$original")]);

        assert_eq!(report.redacted, 1);
        assert_eq!(engine.calls(), vec!["delete !r:x/$original", "commit"]);
        assert_eq!(report.outcomes[0].event_id, "$redaction");
    }

    #[test]
    fn test_redact_batch_skips_non_redactions() {
        let (pipeline, engine) = pipeline(RecordingEngine::default());

        let report = pipeline.redact_batch(&[message("$1", "hi")]);

        assert_eq!(report.skipped, 1);
        assert!(engine.calls().is_empty());
        assert!(!report.committed);
    }

    #[test]
    fn test_delete_failure_recorded() {
        let (pipeline, _) = pipeline(RecordingEngine {
            fail_deletes: true,
            ..Default::default()
        });

        let report = pipeline.redact_batch(&[redaction("$r1", "$a"), redaction("$r2", "$b")]);

        assert_eq!(report.failed, 2);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.kind, OutcomeKind::DeleteFailed(_))));
    }

    #[test]
    fn test_index_batch_skips_redactions_and_discards() {
        let (pipeline, engine) = pipeline(RecordingEngine::default());
        let membership = ChatEvent::message("!r:x", "$m", "@a:x", "m.room.member", 1)
            .with_state_key("@a:x")
            .with_content("membership", "join");

        let report = pipeline.index_batch(&[redaction("$r", "$1"), membership]);

        assert_eq!(report.skipped, 2);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_process_batch_routes_in_order() {
        let (pipeline, engine) = pipeline(RecordingEngine::default());
        let topic = ChatEvent::message("!r:x", "$t", "@a:x", "m.room.topic", 1)
            .with_state_key("")
            .with_content("topic", "Weekly sync");

        let report = pipeline.process_batch(&[
            message("$1", "a"),
            redaction("$r", "$1"),
            ChatEvent::message("!r:x", "$typing", "@a:x", "m.typing", 1),
            topic,
        ]);

        assert_eq!(
            engine.calls(),
            vec!["index !r:x/$1", "delete !r:x/$1", "index !r:x/$t", "commit"]
        );
        let kinds: Vec<&OutcomeKind> = report.outcomes.iter().map(|o| &o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &OutcomeKind::Indexed,
                &OutcomeKind::Redacted,
                &OutcomeKind::Skipped,
                &OutcomeKind::Indexed
            ]
        );
    }

    #[test]
    fn test_commit_failure_reported() {
        let (pipeline, _) = pipeline(RecordingEngine {
            fail_commit: true,
            ..Default::default()
        });

        let report = pipeline.process_batch(&[message("$1", "a")]);
        assert_eq!(report.indexed, 1);
        assert!(!report.committed);
    }

    #[test]
    fn test_empty_batch() {
        let (pipeline, engine) = pipeline(RecordingEngine::default());
        let report = pipeline.process_batch(&[]);
        assert_eq!(report.total(), 0);
        assert!(engine.calls().is_empty());
    }
}

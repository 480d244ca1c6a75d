//! Event filter.

use search_types::{ChatEvent, ContentField};

/// What the pipeline should do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Carries searchable content
    Index,
    /// Removes a previously indexed event
    Redact,
    /// Nothing to index
    Discard,
}

/// True for redactions and for events with at least one recognized content
/// field holding a string.
pub fn should_index(event: &ChatEvent) -> bool {
    event.is_redaction() || has_indexable_content(event)
}

pub fn classify(event: &ChatEvent) -> Disposition {
    if event.is_redaction() {
        Disposition::Redact
    } else if has_indexable_content(event) {
        Disposition::Index
    } else {
        Disposition::Discard
    }
}

fn has_indexable_content(event: &ChatEvent) -> bool {
    ContentField::ALL
        .iter()
        .any(|field| event.content_str(field.as_str()).is_some())
}

//! Mapping from index documents to Tantivy documents.

use tantivy::{DateTime, TantivyDocument};

use search_types::{IndexDocument, IndexKey};

use crate::schema::SearchSchema;

/// Convert an IndexDocument stored under `key` to a Tantivy document.
///
/// Only content fields present on the document are added.
pub fn event_to_doc(schema: &SearchSchema, key: &IndexKey, document: &IndexDocument) -> TantivyDocument {
    let (_, event_id) = key.split();

    let mut doc = TantivyDocument::default();
    doc.add_text(schema.key, key.as_str());
    doc.add_text(schema.room_id, &document.room_id);
    doc.add_text(schema.event_id, event_id);
    doc.add_text(schema.sender, &document.sender);
    doc.add_text(schema.event_type, &document.event_type);

    for (field, text) in &document.content {
        doc.add_text(schema.content_field(*field), text);
    }

    doc.add_date(
        schema.timestamp,
        DateTime::from_timestamp_millis(document.timestamp.timestamp_millis()),
    );

    doc
}

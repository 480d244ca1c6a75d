//! Tantivy schema for chat events.
//!
//! One document per event. Identity and filter fields are raw strings;
//! content fields are tokenized and stored so snippets can be built from
//! them at query time.

use tantivy::schema::{Field, Schema, FAST, INDEXED, STORED, STRING, TEXT};

use search_types::ContentField;

use crate::SearchError;

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct SearchSchema {
    schema: Schema,
    /// Primary key: room_id/event_id (STRING | STORED)
    pub key: Field,
    /// Room the event was sent in (STRING | STORED)
    pub room_id: Field,
    /// Event id (STRING | STORED)
    pub event_id: Field,
    /// Sender user id (STRING | STORED)
    pub sender: Field,
    /// Event type, e.g. m.room.message (STRING | STORED)
    pub event_type: Field,
    /// content.body (TEXT | STORED)
    pub body: Field,
    /// content.name (TEXT | STORED)
    pub name: Field,
    /// content.topic (TEXT | STORED)
    pub topic: Field,
    /// content.url (TEXT | STORED)
    pub url: Field,
    /// Origin timestamp (date, INDEXED | STORED | FAST)
    pub timestamp: Field,
}

impl SearchSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Field handle for a recognized content field
    pub fn content_field(&self, field: ContentField) -> Field {
        match field {
            ContentField::Body => self.body,
            ContentField::Name => self.name,
            ContentField::Topic => self.topic,
            ContentField::Url => self.url,
        }
    }

    /// Create a SearchSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let get = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {} field", name)))
        };

        Ok(Self {
            key: get("key")?,
            room_id: get("room_id")?,
            event_id: get("event_id")?,
            sender: get("sender")?,
            event_type: get("event_type")?,
            body: get("body")?,
            name: get("name")?,
            topic: get("topic")?,
            url: get("url")?,
            timestamp: get("timestamp")?,
            schema,
        })
    }
}

/// Build the event schema.
pub fn build_event_schema() -> SearchSchema {
    let mut schema_builder = Schema::builder();

    let key = schema_builder.add_text_field("key", STRING | STORED);
    let room_id = schema_builder.add_text_field("room_id", STRING | STORED);
    let event_id = schema_builder.add_text_field("event_id", STRING | STORED);
    let sender = schema_builder.add_text_field("sender", STRING | STORED);
    let event_type = schema_builder.add_text_field("event_type", STRING | STORED);

    let body = schema_builder.add_text_field("body", TEXT | STORED);
    let name = schema_builder.add_text_field("name", TEXT | STORED);
    let topic = schema_builder.add_text_field("topic", TEXT | STORED);
    let url = schema_builder.add_text_field("url", TEXT | STORED);

    let timestamp = schema_builder.add_date_field("timestamp", INDEXED | STORED | FAST);

    let schema = schema_builder.build();

    SearchSchema {
        schema,
        key,
        room_id,
        event_id,
        sender,
        event_type,
        body,
        name,
        topic,
        url,
        timestamp,
    }
}

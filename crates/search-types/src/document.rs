//! Normalized documents stored in the search index.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content fields that make an event worth indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentField {
    Body,
    Name,
    Topic,
    Url,
}

impl ContentField {
    /// Every recognized field, in schema order.
    pub const ALL: [ContentField; 4] = [
        ContentField::Body,
        ContentField::Name,
        ContentField::Topic,
        ContentField::Url,
    ];

    /// Fields searched when a query names none.
    pub const DEFAULT_SEARCH: [ContentField; 3] =
        [ContentField::Body, ContentField::Name, ContentField::Topic];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentField::Body => "body",
            ContentField::Name => "name",
            ContentField::Topic => "topic",
            ContentField::Url => "url",
        }
    }

    /// Parse from string, returning None for unknown fields.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "body" => Some(ContentField::Body),
            "name" => Some(ContentField::Name),
            "topic" => Some(ContentField::Topic),
            "url" => Some(ContentField::Url),
            _ => None,
        }
    }
}

impl FromStr for ContentField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown content field: {}", s))
    }
}

impl fmt::Display for ContentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indexable projection of a chat event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub sender: String,
    pub room_id: String,
    pub event_type: String,
    /// Recognized content fields that held a string value
    pub content: BTreeMap<ContentField, String>,
    pub timestamp: DateTime<Utc>,
}

impl IndexDocument {
    pub fn field(&self, field: ContentField) -> Option<&str> {
        self.content.get(&field).map(String::as_str)
    }
}

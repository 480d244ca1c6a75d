//! # search-types
//!
//! Shared domain types for the chat search bridge.
//!
//! This crate defines the data structures passed between the other crates:
//! - Events: chat events as delivered by the homeserver
//! - Documents: the normalized form of an event stored in the index
//! - Keys: the composite room/event handle used for upserts and deletes
//! - Context: resolved surroundings of an event
//! - Settings: layered configuration

pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod event;
pub mod key;

pub use config::Settings;
pub use context::{Context, EventTuple, ResolvedEvent};
pub use document::{ContentField, IndexDocument};
pub use error::TypesError;
pub use event::{ChatEvent, EventKind};
pub use key::{IndexKey, KEY_SEPARATOR};

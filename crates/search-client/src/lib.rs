//! # search-client
//!
//! Typed access to the homeserver client API.
//!
//! [`MatrixClient`] adds the operations the bridge needs (identity, joined
//! rooms, room state, single events, event context windows) on top of a
//! [`Transport`]. Mass resolution walks a list of [`EventTuple`]s one
//! round-trip at a time, either fail-fast or reporting every tuple.
//!
//! [`EventTuple`]: search_types::EventTuple

pub mod client;
pub mod error;
pub mod mock;
pub mod resolve;
pub mod transport;

pub use client::MatrixClient;
pub use error::ClientError;
pub use mock::MockTransport;
pub use resolve::TupleOutcome;
pub use transport::{HttpTransport, HttpTransportConfig, Transport};

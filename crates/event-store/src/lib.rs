//! Append-only event streams backing carts, orders and shoppers.
//!
//! Every stream is versioned; appends carry the version the writer last saw
//! and fail with [`EventStoreError::ConcurrencyConflict`] when another writer
//! got there first. [`EventStore::append_batch`] commits several streams in
//! one all-or-nothing unit, which is what order placement relies on.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{AppendOptions, EventStore, EventStream, StreamAppend};

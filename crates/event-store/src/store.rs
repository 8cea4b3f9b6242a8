use std::collections::HashSet;
use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventEnvelope, EventStoreError, Result, Version};

/// Options for appending events to a stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendOptions {
    /// Version the writer last observed. If None, no version check is
    /// performed and only the per-version uniqueness guards the stream.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stream to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the stream to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }

    /// Picks `expect_new` for an unwritten stream, `expect_version` otherwise.
    pub fn expect_current(version: Version) -> Self {
        if version == Version::initial() {
            Self::expect_new()
        } else {
            Self::expect_version(version)
        }
    }
}

/// Events for one stream inside an atomic multi-stream commit.
#[derive(Debug, Clone)]
pub struct StreamAppend {
    pub events: Vec<EventEnvelope>,
    pub options: AppendOptions,
}

impl StreamAppend {
    pub fn new(events: Vec<EventEnvelope>, options: AppendOptions) -> Self {
        Self { events, options }
    }

    /// The stream these events target. Callers validate first.
    pub(crate) fn aggregate_id(&self) -> Option<AggregateId> {
        self.events.first().map(|e| e.aggregate_id)
    }
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to a single stream.
    ///
    /// Events are appended atomically - either all succeed or none do.
    /// If `options.expected_version` is set, the operation fails with
    /// `ConcurrencyConflict` when the stream's current version differs.
    ///
    /// Returns the new version of the stream.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Appends to several streams as one unit.
    ///
    /// Every stream's expected version is checked before anything is
    /// written; a conflict on any of them writes nothing at all. Returns the
    /// new version of each stream, in input order.
    async fn append_batch(&self, batch: Vec<StreamAppend>) -> Result<Vec<Version>>;

    /// Retrieves all events for a stream, oldest first.
    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>>;

    /// Streams every event in the store in commit order.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Gets the current version of a stream.
    ///
    /// Returns None if the stream doesn't exist.
    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;
}

/// Validates the events of a single-stream append.
///
/// The list must be non-empty, target one stream of one aggregate type and
/// carry consecutive versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let Some((first, rest)) = events.split_first() else {
        return Err(EventStoreError::InvalidAppend(
            "cannot append empty event list".to_string(),
        ));
    };

    let mut expected_version = first.version;
    for event in rest {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidAppend(
                "all events must be for the same aggregate".to_string(),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::InvalidAppend(
                "all events must have the same aggregate type".to_string(),
            ));
        }
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(EventStoreError::InvalidAppend(format!(
                "event versions must be sequential: expected {}, got {}",
                expected_version, event.version
            )));
        }
    }

    Ok(())
}

/// Validates a multi-stream batch: each part must be a valid append and no
/// stream may appear twice.
pub fn validate_batch(batch: &[StreamAppend]) -> Result<()> {
    if batch.is_empty() {
        return Err(EventStoreError::InvalidAppend(
            "cannot commit an empty batch".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(batch.len());
    for part in batch {
        validate_events_for_append(&part.events)?;
        if let Some(id) = part.aggregate_id()
            && !seen.insert(id)
        {
            return Err(EventStoreError::InvalidAppend(format!(
                "aggregate {id} appears more than once in the batch"
            )));
        }
    }

    Ok(())
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Version,
    store::{
        AppendOptions, EventStore, EventStream, StreamAppend, validate_batch,
        validate_events_for_append,
    },
};

#[derive(Default)]
struct Log {
    /// Every event in commit order.
    events: Vec<EventEnvelope>,
    /// Current version of each stream.
    versions: HashMap<AggregateId, Version>,
}

impl Log {
    fn current_version(&self, aggregate_id: AggregateId) -> Version {
        self.versions
            .get(&aggregate_id)
            .copied()
            .unwrap_or_else(Version::initial)
    }

    /// Checks one stream's append against the log without writing.
    fn check(&self, events: &[EventEnvelope], options: AppendOptions) -> Result<()> {
        let Some(first) = events.first() else {
            return Ok(());
        };
        let aggregate_id = first.aggregate_id;
        let current = self.current_version(aggregate_id);

        if let Some(expected) = options.expected_version
            && current != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current,
            });
        }

        // (aggregate_id, version) uniqueness
        if first.version != current.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current),
                actual: current,
            });
        }

        Ok(())
    }

    fn write(&mut self, events: Vec<EventEnvelope>) -> Version {
        let mut last = Version::initial();
        for event in events {
            last = event.version;
            self.versions.insert(event.aggregate_id, event.version);
            self.events.push(event);
        }
        last
    }
}

/// In-memory event store.
///
/// Used by tests and by the API when no database is configured. A single
/// write lock covers each append, so a batch is checked and written as one
/// critical section.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<Log>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.log.read().await.events.len()
    }
}

impl std::fmt::Debug for InMemoryEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let mut log = self.log.write().await;
        log.check(&events, options)?;
        Ok(log.write(events))
    }

    async fn append_batch(&self, batch: Vec<StreamAppend>) -> Result<Vec<Version>> {
        validate_batch(&batch)?;

        let mut log = self.log.write().await;
        for part in &batch {
            log.check(&part.events, part.options)?;
        }

        Ok(batch
            .into_iter()
            .map(|part| log.write(part.events))
            .collect())
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        Ok(log
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.log.read().await.events.clone();
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        Ok(self.log.read().await.versions.get(&aggregate_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_event(
        aggregate_id: AggregateId,
        version: Version,
        event_type: &str,
    ) -> EventEnvelope {
        EventEnvelope::record(
            aggregate_id,
            "Cart",
            event_type,
            version,
            &serde_json::json!({"test": true}),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();
        let cart_id = AggregateId::new();
        let event = create_test_event(cart_id, Version::first(), "CartOpened");

        let version = store
            .append(vec![event], AppendOptions::expect_new())
            .await
            .unwrap();
        assert_eq!(version, Version::first());

        let events = store.get_events_for_aggregate(cart_id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn concurrency_conflict_on_stale_version() {
        let store = InMemoryEventStore::new();
        let cart_id = AggregateId::new();

        store
            .append(
                vec![create_test_event(cart_id, Version::first(), "CartOpened")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        // A second writer that also loaded the empty stream.
        let result = store
            .append(
                vec![create_test_event(cart_id, Version::first(), "CartOpened")],
                AppendOptions::expect_new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn unchecked_append_still_rejects_duplicate_version() {
        let store = InMemoryEventStore::new();
        let cart_id = AggregateId::new();

        store
            .append(
                vec![create_test_event(cart_id, Version::first(), "CartOpened")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let result = store
            .append(
                vec![create_test_event(cart_id, Version::first(), "LineItemAdded")],
                AppendOptions::new(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn batch_writes_every_stream() {
        let store = InMemoryEventStore::new();
        let cart_id = AggregateId::new();
        let order_id = AggregateId::new();

        store
            .append(
                vec![create_test_event(cart_id, Version::first(), "CartOpened")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        let versions = store
            .append_batch(vec![
                StreamAppend::new(
                    vec![create_test_event(cart_id, Version::new(2), "CartCheckedOut")],
                    AppendOptions::expect_version(Version::first()),
                ),
                StreamAppend::new(
                    vec![create_test_event(order_id, Version::first(), "OrderPlaced")],
                    AppendOptions::expect_new(),
                ),
            ])
            .await
            .unwrap();

        assert_eq!(versions, vec![Version::new(2), Version::first()]);
        assert_eq!(store.event_count().await, 3);
    }

    #[tokio::test]
    async fn batch_conflict_writes_nothing() {
        let store = InMemoryEventStore::new();
        let cart_id = AggregateId::new();
        let order_id = AggregateId::new();

        store
            .append(
                vec![
                    create_test_event(cart_id, Version::new(1), "CartOpened"),
                    create_test_event(cart_id, Version::new(2), "LineItemAdded"),
                ],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        // The order stream is fine, the cart stream is stale.
        let result = store
            .append_batch(vec![
                StreamAppend::new(
                    vec![create_test_event(order_id, Version::first(), "OrderPlaced")],
                    AppendOptions::expect_new(),
                ),
                StreamAppend::new(
                    vec![create_test_event(cart_id, Version::new(2), "CartCheckedOut")],
                    AppendOptions::expect_version(Version::first()),
                ),
            ])
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
        assert_eq!(store.get_aggregate_version(order_id).await.unwrap(), None);
        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn stream_all_events_in_commit_order() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        store
            .append(
                vec![create_test_event(id1, Version::first(), "CartOpened")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(id2, Version::first(), "CartOpened")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let stream = store.stream_all_events().await.unwrap();
        let events: Vec<_> = stream.collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().aggregate_id, id1);
    }

    #[tokio::test]
    async fn get_aggregate_version() {
        let store = InMemoryEventStore::new();
        let cart_id = AggregateId::new();

        assert!(
            store
                .get_aggregate_version(cart_id)
                .await
                .unwrap()
                .is_none()
        );

        let events = vec![
            create_test_event(cart_id, Version::new(1), "CartOpened"),
            create_test_event(cart_id, Version::new(2), "LineItemAdded"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        let version = store.get_aggregate_version(cart_id).await.unwrap();
        assert_eq!(version, Some(Version::new(2)));
    }
}

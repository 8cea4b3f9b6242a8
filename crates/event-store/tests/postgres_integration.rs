//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container and truncate the event log
//! between cases. Run with:
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration
//! ```

use std::sync::Arc;

use common::UserId;
use event_store::{
    AggregateId, AppendOptions, EventEnvelope, EventStore, EventStoreError, PostgresEventStore,
    StreamAppend, Version,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    _container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresEventStore::new(pool.clone())
                .run_migrations()
                .await
                .unwrap();
            pool.close().await;

            Arc::new(ContainerInfo {
                _container: container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and an empty event log
async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE events")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

fn create_test_event(
    aggregate_id: AggregateId,
    aggregate_type: &str,
    version: Version,
    event_type: &str,
) -> EventEnvelope {
    EventEnvelope::record(
        aggregate_id,
        aggregate_type,
        event_type,
        version,
        &serde_json::json!({"test": true}),
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn append_and_retrieve_events() {
    let store = get_test_store().await;
    let cart_id = AggregateId::new();

    let shopper = UserId::new();

    let events = vec![
        create_test_event(cart_id, "Cart", Version::new(1), "CartOpened"),
        create_test_event(cart_id, "Cart", Version::new(2), "LineItemAdded").by(Some(shopper)),
    ];
    let version = store
        .append(events, AppendOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(version, Version::new(2));

    let stored = store.get_events_for_aggregate(cart_id).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].event_type, "CartOpened");
    assert_eq!(stored[1].version, Version::new(2));
    assert_eq!(stored[0].actor, None);
    assert_eq!(stored[1].actor, Some(shopper));
    assert_eq!(stored[1].payload, serde_json::json!({"test": true}));
    assert_eq!(
        store.get_aggregate_version(cart_id).await.unwrap(),
        Some(Version::new(2))
    );
}

#[tokio::test]
#[serial]
async fn stale_writer_gets_conflict() {
    let store = get_test_store().await;
    let cart_id = AggregateId::new();

    store
        .append(
            vec![create_test_event(cart_id, "Cart", Version::first(), "CartOpened")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let result = store
        .append(
            vec![create_test_event(cart_id, "Cart", Version::first(), "CartOpened")],
            AppendOptions::expect_new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[serial]
async fn unchecked_duplicate_version_hits_unique_constraint() {
    let store = get_test_store().await;
    let cart_id = AggregateId::new();

    store
        .append(
            vec![create_test_event(cart_id, "Cart", Version::first(), "CartOpened")],
            AppendOptions::new(),
        )
        .await
        .unwrap();

    let result = store
        .append(
            vec![create_test_event(cart_id, "Cart", Version::first(), "LineItemAdded")],
            AppendOptions::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
}

#[tokio::test]
#[serial]
async fn batch_commits_all_streams() {
    let store = get_test_store().await;
    let cart_id = AggregateId::new();
    let order_id = AggregateId::new();

    store
        .append(
            vec![create_test_event(cart_id, "Cart", Version::first(), "CartOpened")],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    let versions = store
        .append_batch(vec![
            StreamAppend::new(
                vec![create_test_event(cart_id, "Cart", Version::new(2), "CartCheckedOut")],
                AppendOptions::expect_version(Version::first()),
            ),
            StreamAppend::new(
                vec![create_test_event(order_id, "Order", Version::first(), "OrderPlaced")],
                AppendOptions::expect_new(),
            ),
        ])
        .await
        .unwrap();

    assert_eq!(versions, vec![Version::new(2), Version::first()]);
    assert_eq!(
        store.get_aggregate_version(order_id).await.unwrap(),
        Some(Version::first())
    );
}

#[tokio::test]
#[serial]
async fn batch_conflict_rolls_back_every_stream() {
    let store = get_test_store().await;
    let cart_id = AggregateId::new();
    let order_id = AggregateId::new();

    store
        .append(
            vec![
                create_test_event(cart_id, "Cart", Version::new(1), "CartOpened"),
                create_test_event(cart_id, "Cart", Version::new(2), "LineItemAdded"),
            ],
            AppendOptions::expect_new(),
        )
        .await
        .unwrap();

    // The order insert runs first and must not survive the cart conflict.
    let result = store
        .append_batch(vec![
            StreamAppend::new(
                vec![create_test_event(order_id, "Order", Version::first(), "OrderPlaced")],
                AppendOptions::expect_new(),
            ),
            StreamAppend::new(
                vec![create_test_event(cart_id, "Cart", Version::new(2), "CartCheckedOut")],
                AppendOptions::expect_version(Version::first()),
            ),
        ])
        .await;

    assert!(matches!(
        result,
        Err(EventStoreError::ConcurrencyConflict { .. })
    ));
    assert_eq!(store.get_aggregate_version(order_id).await.unwrap(), None);
    assert_eq!(
        store.get_aggregate_version(cart_id).await.unwrap(),
        Some(Version::new(2))
    );
}

#[tokio::test]
#[serial]
async fn stream_all_events_in_commit_order() {
    use futures_util::StreamExt;

    let store = get_test_store().await;
    let first = AggregateId::new();
    let second = AggregateId::new();

    for id in [first, second] {
        store
            .append(
                vec![create_test_event(id, "Cart", Version::first(), "CartOpened")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();
    }

    let events: Vec<_> = store.stream_all_events().await.unwrap().collect().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].as_ref().unwrap().aggregate_id, first);
    assert_eq!(events[1].as_ref().unwrap().aggregate_id, second);
}

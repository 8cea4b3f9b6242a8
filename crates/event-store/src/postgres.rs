use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    AggregateId, EventEnvelope, EventId, EventStoreError, Result, Version,
    store::{
        AppendOptions, EventStore, EventStream, StreamAppend, validate_batch,
        validate_events_for_append,
    },
};

const SELECT_EVENTS: &str = r#"
    SELECT id, aggregate_id, aggregate_type, event_type, version, recorded_at, actor_id, payload
    FROM events
"#;

/// Row shape of the `events` table.
#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    aggregate_id: Uuid,
    aggregate_type: String,
    event_type: String,
    version: i64,
    recorded_at: DateTime<Utc>,
    actor_id: Option<Uuid>,
    payload: serde_json::Value,
}

impl From<EventRow> for EventEnvelope {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: EventId::from_uuid(row.id),
            aggregate_id: AggregateId::from_uuid(row.aggregate_id),
            aggregate_type: row.aggregate_type,
            event_type: row.event_type,
            version: Version::new(row.version),
            recorded_at: row.recorded_at,
            actor: row.actor_id.map(UserId::from_uuid),
            payload: row.payload,
        }
    }
}

async fn current_version<'e>(
    executor: impl PgExecutor<'e>,
    aggregate_id: AggregateId,
) -> Result<Option<Version>> {
    let version: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM events WHERE aggregate_id = $1")
            .bind(aggregate_id.as_uuid())
            .fetch_one(executor)
            .await?;
    Ok(version.map(Version::new))
}

/// PostgreSQL-backed event store.
///
/// Each append runs in one transaction. The `unique_aggregate_version`
/// constraint turns a lost race between two writers into a
/// [`EventStoreError::ConcurrencyConflict`] and rolls the loser back.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `events` table if it does not exist yet.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Checks and inserts one stream's events inside an open transaction.
    async fn append_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        events: &[EventEnvelope],
        options: AppendOptions,
    ) -> Result<Version> {
        let Some(first) = events.first() else {
            return Err(EventStoreError::InvalidAppend(
                "cannot append empty event list".to_string(),
            ));
        };
        let aggregate_id = first.aggregate_id;

        if let Some(expected) = options.expected_version {
            let actual = current_version(&mut **tx, aggregate_id)
                .await?
                .unwrap_or_else(Version::initial);
            if actual != expected {
                return Err(EventStoreError::ConcurrencyConflict {
                    aggregate_id,
                    expected,
                    actual,
                });
            }
        }

        let mut last_version = Version::initial();
        for event in events {
            sqlx::query(
                r#"
                INSERT INTO events
                    (id, aggregate_id, aggregate_type, event_type, version, recorded_at, actor_id, payload)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(event.event_id.as_uuid())
            .bind(event.aggregate_id.as_uuid())
            .bind(&event.aggregate_type)
            .bind(&event.event_type)
            .bind(event.version.as_i64())
            .bind(event.recorded_at)
            .bind(event.actor.map(|user| user.as_uuid()))
            .bind(&event.payload)
            .execute(&mut **tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err)
                    if db_err.constraint() == Some("unique_aggregate_version") =>
                {
                    EventStoreError::ConcurrencyConflict {
                        aggregate_id,
                        expected: options.expected_version.unwrap_or_else(Version::initial),
                        actual: event.version,
                    }
                }
                other => EventStoreError::Database(other),
            })?;

            last_version = event.version;
        }

        Ok(last_version)
    }
}

impl std::fmt::Debug for PostgresEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresEventStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let mut tx = self.pool.begin().await?;
        let version = Self::append_in_tx(&mut tx, &events, options).await?;
        tx.commit().await?;

        Ok(version)
    }

    async fn append_batch(&self, batch: Vec<StreamAppend>) -> Result<Vec<Version>> {
        validate_batch(&batch)?;

        // Dropping the transaction on any error rolls back every stream.
        let mut tx = self.pool.begin().await?;
        let mut versions = Vec::with_capacity(batch.len());
        for part in &batch {
            versions.push(Self::append_in_tx(&mut tx, &part.events, part.options).await?);
        }
        tx.commit().await?;

        tracing::debug!(streams = versions.len(), "committed batch");
        Ok(versions)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let rows: Vec<EventRow> = sqlx::query_as(&format!(
            "{SELECT_EVENTS} WHERE aggregate_id = $1 ORDER BY version ASC"
        ))
        .bind(aggregate_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EventEnvelope::from).collect())
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let rows: Vec<EventRow> = sqlx::query_as(&format!("{SELECT_EVENTS} ORDER BY position ASC"))
            .fetch_all(&self.pool)
            .await?;

        Ok(Box::pin(stream::iter(
            rows.into_iter().map(|row| Ok(EventEnvelope::from(row))),
        )))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        current_version(&self.pool, aggregate_id).await
    }
}

//! Command handling infrastructure.

use std::marker::PhantomData;

use common::{AggregateId, UserId};
use event_store::{AppendOptions, EventEnvelope, EventStore, StreamAppend, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::CheckoutError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and persisted.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,

    /// How many times the command was re-run after losing a race.
    pub retries: u32,
}

/// Loads aggregates and runs commands against them.
///
/// Every command is load, decide, append with the loaded version as the
/// expected version. A [`event_store::EventStoreError::ConcurrencyConflict`]
/// means another writer got there first; the command is re-run against
/// freshly loaded state up to `max_retries` times.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    max_retries: u32,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with the given event store.
    pub fn new(store: S, max_retries: u32) -> Self {
        Self {
            store,
            max_retries,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an aggregate by replaying its stream.
    ///
    /// If the stream is empty, returns a default instance.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, CheckoutError> {
        let envelopes = self.store.get_events_for_aggregate(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in envelopes {
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, CheckoutError> {
        let aggregate = self.load(aggregate_id).await?;
        Ok(aggregate.id().is_some().then_some(aggregate))
    }

    /// Executes a command and persists the resulting events, attributed to
    /// `actor`.
    ///
    /// The command function receives the current aggregate state and returns
    /// the events to record or a rejection. It may run more than once.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        actor: Option<UserId>,
        mut command_fn: F,
    ) -> Result<CommandResult<A>, CheckoutError>
    where
        F: FnMut(&A) -> Result<Vec<A::Event>, A::Error>,
        CheckoutError: From<A::Error>,
    {
        let mut retries = 0;
        loop {
            let mut aggregate = self.load(aggregate_id).await?;
            let current_version = aggregate.version();

            let events = command_fn(&aggregate)?;
            if events.is_empty() {
                return Ok(CommandResult {
                    aggregate,
                    events,
                    new_version: current_version,
                    retries,
                });
            }

            let envelopes = build_envelopes::<A>(aggregate_id, actor, current_version, &events)?;
            let options = AppendOptions::expect_current(current_version);

            match self.store.append(envelopes, options).await {
                Ok(new_version) => {
                    aggregate.apply_events(events.iter().cloned());
                    aggregate.set_version(new_version);
                    return Ok(CommandResult {
                        aggregate,
                        events,
                        new_version,
                        retries,
                    });
                }
                Err(e) if e.is_conflict() && retries < self.max_retries => {
                    retries += 1;
                    record_retry(A::aggregate_type(), aggregate_id, retries);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Packages events for `aggregate` into one stream of a multi-stream
    /// commit, expecting the stream to still be at the loaded version.
    pub fn stage(
        &self,
        aggregate_id: AggregateId,
        actor: Option<UserId>,
        aggregate: &A,
        events: &[A::Event],
    ) -> Result<StreamAppend, CheckoutError> {
        let envelopes = build_envelopes::<A>(aggregate_id, actor, aggregate.version(), events)?;
        Ok(StreamAppend::new(
            envelopes,
            AppendOptions::expect_current(aggregate.version()),
        ))
    }

    /// Returns the configured retry bound.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Logs and counts one lost optimistic-concurrency race.
pub(crate) fn record_retry(aggregate_type: &'static str, aggregate_id: AggregateId, attempt: u32) {
    tracing::warn!(
        aggregate_type,
        %aggregate_id,
        attempt,
        "concurrency conflict, retrying against fresh state"
    );
    metrics::counter!("checkout_conflict_retries_total").increment(1);
}

/// Builds event envelopes from domain events, numbering them after
/// `current_version`.
fn build_envelopes<A: Aggregate>(
    aggregate_id: AggregateId,
    actor: Option<UserId>,
    current_version: Version,
    events: &[A::Event],
) -> Result<Vec<EventEnvelope>, CheckoutError> {
    let mut envelopes = Vec::with_capacity(events.len());
    let mut version = current_version;

    for event in events {
        version = version.next();
        let envelope = EventEnvelope::record(
            aggregate_id,
            A::aggregate_type(),
            event.event_type(),
            version,
            event,
        )?
        .by(actor);
        envelopes.push(envelope);
    }

    Ok(envelopes)
}

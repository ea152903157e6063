//! Aggregate repository: loads aggregates from and stores them to an event store.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::aggregate::{AggregateRoot, BoxedAggregate};
use crate::command::Command;
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::factory::AggregateFactory;
use crate::identifier::AggregateId;
use crate::store::EventStore;

/// Port for loading and storing aggregates.
pub trait AggregateRepository<C, E>: Send + Sync
where
    C: Command,
    E: DomainEvent,
{
    /// Builds a fresh aggregate of `aggregate_type` and replays its stream.
    ///
    /// An aggregate with no history comes back at version 0.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotRegistered`, any error from the event
    /// store, or `DomainError::EventApplierNotFound` if the history contains an
    /// event the aggregate cannot apply.
    fn load(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
    ) -> Result<BoxedAggregate<C, E>, DomainError>;

    /// Appends `events` at the aggregate's current version, then marks its
    /// pending changes as committed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the stream moved since the
    /// aggregate was loaded, or any other store error. The aggregate is left
    /// unchanged on error.
    fn store(
        &self,
        aggregate: &mut dyn AggregateRoot<C, E>,
        events: &[E],
    ) -> Result<(), DomainError>;
}

/// Repository that reconstitutes aggregates by replaying their event streams.
pub struct EventSourcedRepository<C, E> {
    factory: Arc<AggregateFactory<C, E>>,
    event_store: Arc<dyn EventStore<E>>,
}

impl<C, E> EventSourcedRepository<C, E>
where
    C: Command,
    E: DomainEvent,
{
    /// Creates a repository over `event_store` using `factory` for construction.
    #[must_use]
    pub fn new(factory: Arc<AggregateFactory<C, E>>, event_store: Arc<dyn EventStore<E>>) -> Self {
        Self {
            factory,
            event_store,
        }
    }
}

impl<C, E> AggregateRepository<C, E> for EventSourcedRepository<C, E>
where
    C: Command,
    E: DomainEvent,
{
    fn load(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
    ) -> Result<BoxedAggregate<C, E>, DomainError> {
        let mut aggregate = self.factory.create(aggregate_type, aggregate_id)?;
        let history = self.event_store.load_stream(aggregate_id)?;
        aggregate.load_from_history(&history)?;
        debug!(
            %aggregate_id,
            aggregate_type,
            version = aggregate.version(),
            "aggregate loaded"
        );
        Ok(aggregate)
    }

    fn store(
        &self,
        aggregate: &mut dyn AggregateRoot<C, E>,
        events: &[E],
    ) -> Result<(), DomainError> {
        let aggregate_id = aggregate.aggregate_id();
        let expected_version = aggregate.version();
        self.event_store
            .append(aggregate_id, expected_version, events)?;
        aggregate.mark_changes_as_committed();
        debug!(
            %aggregate_id,
            expected_version,
            appended = events.len(),
            "aggregate stored"
        );
        Ok(())
    }
}

impl<C, E> fmt::Debug for EventSourcedRepository<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSourcedRepository")
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

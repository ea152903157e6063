//! In-memory implementation of the `EventStore` trait.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use tracing::{debug, warn};

use chronicle_core::error::DomainError;
use chronicle_core::event::DomainEvent;
use chronicle_core::identifier::AggregateId;
use chronicle_core::store::EventStore;

/// Event store keeping every stream in a process-local map.
///
/// One reader/writer lock guards the whole map: loads share it, appends take
/// it exclusively, so the version check and the extend of one append are
/// atomic with respect to every other append.
pub struct InMemoryEventStore<E> {
    streams: RwLock<HashMap<AggregateId, Vec<E>>>,
}

impl<E: DomainEvent> InMemoryEventStore<E> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the current length of the aggregate's stream.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the lock is poisoned.
    pub fn stream_version(&self, aggregate_id: AggregateId) -> Result<u64, DomainError> {
        let streams = self.streams.read().map_err(poisoned)?;
        Ok(streams.get(&aggregate_id).map_or(0, |stream| stream.len() as u64))
    }
}

impl<E: DomainEvent> Default for InMemoryEventStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DomainEvent> EventStore<E> for InMemoryEventStore<E> {
    fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<E>, DomainError> {
        let streams = self.streams.read().map_err(poisoned)?;
        let events = streams.get(&aggregate_id).cloned().unwrap_or_default();
        debug!(%aggregate_id, events = events.len(), "stream loaded");
        Ok(events)
    }

    fn append(
        &self,
        aggregate_id: AggregateId,
        expected_version: u64,
        events: &[E],
    ) -> Result<(), DomainError> {
        let mut streams = self.streams.write().map_err(poisoned)?;

        let actual = streams
            .get(&aggregate_id)
            .map_or(0, |stream| stream.len() as u64);
        if actual != expected_version {
            warn!(
                %aggregate_id,
                expected = expected_version,
                actual,
                "optimistic concurrency conflict"
            );
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        streams
            .entry(aggregate_id)
            .or_default()
            .extend_from_slice(events);
        debug!(
            %aggregate_id,
            expected_version,
            appended = events.len(),
            "events appended"
        );
        Ok(())
    }
}

impl<E> fmt::Debug for InMemoryEventStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let streams = self.streams.read().map(|streams| streams.len()).ok();
        f.debug_struct("InMemoryEventStore")
            .field("streams", &streams)
            .finish()
    }
}

fn poisoned<T>(_: T) -> DomainError {
    DomainError::Infrastructure("event store lock poisoned".into())
}

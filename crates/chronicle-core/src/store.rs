//! Event store port.

use std::sync::Arc;

use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::identifier::AggregateId;

/// Durable, append-only storage of per-aggregate event streams.
///
/// Implementations must make the version check and the append of one call
/// atomic with respect to other appends to the same aggregate.
pub trait EventStore<E: DomainEvent>: Send + Sync {
    /// Loads the full stream for an aggregate, in append order.
    ///
    /// An unknown aggregate yields an empty stream.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the backing store fails.
    fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<E>, DomainError>;

    /// Appends `events` to the aggregate's stream if and only if its current
    /// length equals `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the stream length differs
    /// from `expected_version` (nothing is appended), or
    /// `DomainError::Infrastructure` if the backing store fails.
    fn append(
        &self,
        aggregate_id: AggregateId,
        expected_version: u64,
        events: &[E],
    ) -> Result<(), DomainError>;
}

impl<E, T> EventStore<E> for Arc<T>
where
    E: DomainEvent,
    T: EventStore<E> + ?Sized,
{
    fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<E>, DomainError> {
        (**self).load_stream(aggregate_id)
    }

    fn append(
        &self,
        aggregate_id: AggregateId,
        expected_version: u64,
        events: &[E],
    ) -> Result<(), DomainError> {
        (**self).append(aggregate_id, expected_version, events)
    }
}

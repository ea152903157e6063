//! Unit of work: several aggregate mutations committed together.
//!
//! Each aggregate's events are appended under its own optimistic check.
//! There is no multi-stream atomicity: if a later append fails after earlier
//! ones succeeded, the earlier appends stay durable, their events are still
//! published, and the caller receives `DomainError::PartialCommit` naming
//! them.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::aggregate::{AggregateRoot, BoxedAggregate};
use crate::bus::EventPublisher;
use crate::command::Command;
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::identifier::AggregateId;
use crate::identity_map::IdentityMap;
use crate::repository::AggregateRepository;

/// Session tracking loaded aggregates until they are committed or rolled back.
pub struct UnitOfWork<C, E> {
    repository: Arc<dyn AggregateRepository<C, E>>,
    publisher: Arc<dyn EventPublisher<E>>,
    identity_map: IdentityMap<C, E>,
}

impl<C, E> UnitOfWork<C, E>
where
    C: Command,
    E: DomainEvent,
{
    /// Opens an empty session.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AggregateRepository<C, E>>,
        publisher: Arc<dyn EventPublisher<E>>,
    ) -> Self {
        Self {
            repository,
            publisher,
            identity_map: IdentityMap::new(),
        }
    }

    /// Returns the tracked instance of `aggregate_id`, loading and tracking
    /// it through the repository on first access.
    ///
    /// # Errors
    ///
    /// Returns any error from `AggregateRepository::load`; nothing is tracked
    /// in that case. Returns `DomainError::AggregateTypeMismatch` if the
    /// tracked instance has a different type than `aggregate_type`.
    pub fn load(
        &mut self,
        aggregate_id: AggregateId,
        aggregate_type: &str,
    ) -> Result<&mut dyn AggregateRoot<C, E>, DomainError> {
        if !self.identity_map.contains(aggregate_id) {
            let aggregate = self.repository.load(aggregate_id, aggregate_type)?;
            self.identity_map.insert(aggregate);
        }
        let aggregate = self
            .identity_map
            .get_mut(aggregate_id)
            .ok_or(DomainError::AggregateNotFound(aggregate_id))?;
        if aggregate.aggregate_type() != aggregate_type {
            return Err(DomainError::AggregateTypeMismatch {
                aggregate_id,
                requested: aggregate_type.to_owned(),
                actual: aggregate.aggregate_type().to_owned(),
            });
        }
        Ok(aggregate)
    }

    /// Tracks an aggregate that was not loaded through this session, such as
    /// one freshly built by a factory. Returns the instance it displaced.
    pub fn track(&mut self, aggregate: BoxedAggregate<C, E>) -> Option<BoxedAggregate<C, E>> {
        self.identity_map.insert(aggregate)
    }

    /// Handles `command` on the tracked instance of its target aggregate.
    /// The produced events stay pending until `commit`.
    ///
    /// # Errors
    ///
    /// Returns any load error or the aggregate's command error.
    #[instrument(
        skip_all,
        fields(
            command_type = command.command_type(),
            aggregate_id = %command.aggregate_id(),
        )
    )]
    pub fn handle(&mut self, command: &C) -> Result<Vec<E>, DomainError> {
        let aggregate = self.load(command.aggregate_id(), command.aggregate_type())?;
        let events = aggregate.handle(command)?;
        debug!(events = events.len(), "command handled in unit of work");
        Ok(events)
    }

    /// Returns `true` if `aggregate_id` is tracked by this session.
    #[must_use]
    pub fn is_tracked(&self, aggregate_id: AggregateId) -> bool {
        self.identity_map.contains(aggregate_id)
    }

    /// Number of tracked aggregates.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.identity_map.len()
    }

    /// Stores every tracked aggregate with pending changes, in tracking order,
    /// then publishes the committed events in the same order and ends the
    /// session. Returns the published events.
    ///
    /// # Errors
    ///
    /// - If the first store fails, its error is returned unchanged and the
    ///   session is left as it was, ready for `rollback` or a retry.
    /// - If a store fails after others succeeded, returns
    ///   `DomainError::PartialCommit`. The committed aggregates stay durable
    ///   and their events are published; the uncommitted remainder stays
    ///   tracked, so a later `commit` stores and publishes only the rest.
    /// - If publishing fails, the publisher's error is returned; the events
    ///   are already durable and the session has ended.
    #[instrument(skip_all, fields(tracked = self.identity_map.len()))]
    pub fn commit(&mut self) -> Result<Vec<E>, DomainError> {
        let mut committed = Vec::new();
        let mut events = Vec::new();
        let mut failure = None;

        for aggregate in self.identity_map.iter_mut() {
            let pending = aggregate.uncommitted_changes().to_vec();
            if pending.is_empty() {
                continue;
            }
            if let Err(err) = self.repository.store(aggregate, &pending) {
                failure = Some(err);
                break;
            }
            committed.push(aggregate.aggregate_id());
            events.extend(pending);
        }

        if let Some(err) = failure {
            if committed.is_empty() {
                return Err(err);
            }
            warn!(
                committed = committed.len(),
                error = %err,
                "unit of work partially committed; earlier appends are not undone"
            );
            if let Err(publish_err) = self.publisher.publish(&events) {
                warn!(error = %publish_err, "partially committed events were not published");
            }
            return Err(DomainError::PartialCommit {
                committed,
                source: Box::new(err),
            });
        }

        self.identity_map.clear();

        if let Err(err) = self.publisher.publish(&events) {
            warn!(error = %err, "unit of work stored but publish failed");
            return Err(err);
        }

        info!(
            aggregates = committed.len(),
            events = events.len(),
            "unit of work committed"
        );
        Ok(events)
    }

    /// Ends the session without storing anything, discarding pending events.
    pub fn rollback(&mut self) {
        let discarded = self.identity_map.len();
        self.identity_map.clear();
        debug!(discarded, "unit of work rolled back");
    }
}

impl<C, E> fmt::Debug for UnitOfWork<C, E>
where
    C: Command,
    E: DomainEvent,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("identity_map", &self.identity_map)
            .finish_non_exhaustive()
    }
}

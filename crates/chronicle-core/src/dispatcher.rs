//! Command dispatcher: load, handle, store, publish.

use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::bus::EventPublisher;
use crate::command::Command;
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::repository::AggregateRepository;

/// Executes one command end to end against an aggregate.
pub struct Dispatcher<C, E> {
    repository: Arc<dyn AggregateRepository<C, E>>,
    publisher: Arc<dyn EventPublisher<E>>,
}

impl<C, E> Dispatcher<C, E>
where
    C: Command,
    E: DomainEvent,
{
    /// Creates a dispatcher from its two collaborators.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AggregateRepository<C, E>>,
        publisher: Arc<dyn EventPublisher<E>>,
    ) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// Starts a builder that validates its collaborators on `build`.
    #[must_use]
    pub fn builder() -> DispatcherBuilder<C, E> {
        DispatcherBuilder::default()
    }

    /// Loads the target aggregate, handles `command`, stores the produced
    /// events and publishes them. Returns the produced events.
    ///
    /// Steps run in that order and the first failure short-circuits. A
    /// publish failure is reported after the events are already durable;
    /// the append is not rolled back.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing step unchanged: a load error
    /// (`AggregateNotRegistered`, store or applier errors), a command error
    /// (`CommandHandlerNotFound`, `EventApplierNotFound`, `Validation`), a
    /// `ConcurrencyConflict` or other store error, or a subscriber error.
    #[instrument(
        skip_all,
        fields(
            command_type = command.command_type(),
            aggregate_id = %command.aggregate_id(),
        )
    )]
    pub fn handle(&self, command: &C) -> Result<Vec<E>, DomainError> {
        let mut aggregate = self
            .repository
            .load(command.aggregate_id(), command.aggregate_type())?;

        let events = aggregate.handle(command)?;

        self.repository.store(aggregate.as_mut(), &events)?;

        if let Err(err) = self.publisher.publish(&events) {
            warn!(error = %err, "events stored but publish failed");
            return Err(err);
        }

        info!(
            events = events.len(),
            version = aggregate.version(),
            "command dispatched"
        );
        Ok(events)
    }
}

impl<C, E> fmt::Debug for Dispatcher<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder<C, E> {
    repository: Option<Arc<dyn AggregateRepository<C, E>>>,
    publisher: Option<Arc<dyn EventPublisher<E>>>,
}

impl<C, E> DispatcherBuilder<C, E>
where
    C: Command,
    E: DomainEvent,
{
    /// Sets the aggregate repository.
    #[must_use]
    pub fn repository(mut self, repository: Arc<dyn AggregateRepository<C, E>>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn publisher(mut self, publisher: Arc<dyn EventPublisher<E>>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Builds the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MissingDependency` naming the first collaborator
    /// that was not supplied.
    pub fn build(self) -> Result<Dispatcher<C, E>, DomainError> {
        let repository = self
            .repository
            .ok_or(DomainError::MissingDependency("aggregate repository"))?;
        let publisher = self
            .publisher
            .ok_or(DomainError::MissingDependency("event publisher"))?;
        Ok(Dispatcher::new(repository, publisher))
    }
}

impl<C, E> Default for DispatcherBuilder<C, E> {
    fn default() -> Self {
        Self {
            repository: None,
            publisher: None,
        }
    }
}

impl<C, E> fmt::Debug for DispatcherBuilder<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("repository", &self.repository.is_some())
            .field("publisher", &self.publisher.is_some())
            .finish()
    }
}

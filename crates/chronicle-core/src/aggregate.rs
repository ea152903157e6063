//! Aggregate root abstraction and the event-sourced aggregate.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::command::Command;
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::identifier::AggregateId;
use crate::registry::{CommandHandlers, EventAppliers};

/// Trait for aggregate roots that reconstitute from event history.
///
/// Object safe, so a factory can hand out aggregates of different concrete
/// state types behind one `Box<dyn AggregateRoot<C, E>>`.
pub trait AggregateRoot<C, E>: Send + Sync
where
    C: Command,
    E: DomainEvent,
{
    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> AggregateId;

    /// Returns the aggregate type tag.
    fn aggregate_type(&self) -> &'static str;

    /// Returns the committed version: the durable stream length as of the
    /// last load or store. Pending events are not counted.
    fn version(&self) -> u64;

    /// Handles a command, applying and recording every event it produces.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CommandHandlerNotFound` if the command type has no
    /// handler, `DomainError::EventApplierNotFound` if a produced event has no
    /// applier, or the handler's own error. On error, state, version and the
    /// pending list are exactly as before the call.
    fn handle(&mut self, command: &C) -> Result<Vec<E>, DomainError>;

    /// Applies and records events without going through a command handler.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventApplierNotFound` if any event has no
    /// applier; nothing is applied or recorded in that case.
    fn apply(&mut self, events: &[E]) -> Result<(), DomainError>;

    /// Replays a durable history. Sets the version to `events.len()` and
    /// clears the pending list; replayed events are never recorded as pending.
    ///
    /// The events are folded onto the current state, which is not reset, so
    /// replay expects a fresh aggregate as built by the factory.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventApplierNotFound` if any event has no
    /// applier; the aggregate is untouched in that case.
    fn load_from_history(&mut self, events: &[E]) -> Result<(), DomainError>;

    /// Returns pending events in the order they were produced.
    fn uncommitted_changes(&self) -> &[E];

    /// Clears pending events and folds their count into the version.
    ///
    /// Called by the repository after a successful durable append.
    fn mark_changes_as_committed(&mut self);

    /// Returns the domain state as `Any`, for downcasting by callers that
    /// know the concrete state type.
    fn state_any(&self) -> &dyn Any;
}

impl<'a, C, E> dyn AggregateRoot<C, E> + 'a
where
    C: Command,
    E: DomainEvent,
{
    /// Returns the domain state if it is of type `S`.
    #[must_use]
    pub fn state<S: Any>(&self) -> Option<&S> {
        self.state_any().downcast_ref::<S>()
    }
}

/// A boxed aggregate as produced by the factory and repository.
pub type BoxedAggregate<C, E> = Box<dyn AggregateRoot<C, E>>;

/// Event-sourced aggregate composing domain state with its registries,
/// version and pending change list.
pub struct EventSourced<S, C, E> {
    id: AggregateId,
    aggregate_type: &'static str,
    state: S,
    /// Committed version (durable stream length).
    version: u64,
    /// Events produced since load, pending persistence.
    uncommitted_events: Vec<E>,
    handlers: Arc<CommandHandlers<S, C, E>>,
    appliers: Arc<EventAppliers<S, E>>,
}

impl<S, C, E> EventSourced<S, C, E>
where
    C: Command,
    E: DomainEvent,
{
    /// Creates a fresh, unhydrated aggregate at version 0.
    #[must_use]
    pub fn new(
        id: AggregateId,
        aggregate_type: &'static str,
        state: S,
        handlers: Arc<CommandHandlers<S, C, E>>,
        appliers: Arc<EventAppliers<S, E>>,
    ) -> Self {
        Self {
            id,
            aggregate_type,
            state,
            version: 0,
            uncommitted_events: Vec::new(),
            handlers,
            appliers,
        }
    }

    /// Returns the domain state.
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<S, C, E> AggregateRoot<C, E> for EventSourced<S, C, E>
where
    S: Send + Sync + 'static,
    C: Command,
    E: DomainEvent,
{
    fn aggregate_id(&self) -> AggregateId {
        self.id
    }

    fn aggregate_type(&self) -> &'static str {
        self.aggregate_type
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn handle(&mut self, command: &C) -> Result<Vec<E>, DomainError> {
        let events = self.handlers.handle(&self.state, command)?;
        self.apply(&events)?;
        Ok(events)
    }

    fn apply(&mut self, events: &[E]) -> Result<(), DomainError> {
        self.appliers.apply_all(&mut self.state, events)?;
        self.uncommitted_events.extend_from_slice(events);
        Ok(())
    }

    fn load_from_history(&mut self, events: &[E]) -> Result<(), DomainError> {
        self.appliers.apply_all(&mut self.state, events)?;
        self.version = events.len() as u64;
        self.uncommitted_events.clear();
        Ok(())
    }

    fn uncommitted_changes(&self) -> &[E] {
        &self.uncommitted_events
    }

    fn mark_changes_as_committed(&mut self) {
        self.version += self.uncommitted_events.len() as u64;
        self.uncommitted_events.clear();
    }

    fn state_any(&self) -> &dyn Any {
        &self.state
    }
}

impl<S, C, E> fmt::Debug for EventSourced<S, C, E>
where
    S: fmt::Debug,
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSourced")
            .field("id", &self.id)
            .field("aggregate_type", &self.aggregate_type)
            .field("version", &self.version)
            .field("state", &self.state)
            .field("uncommitted_events", &self.uncommitted_events)
            .finish_non_exhaustive()
    }
}

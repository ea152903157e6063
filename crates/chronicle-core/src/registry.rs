//! Command handler and event applier registries.
//!
//! Both are pure lookup tables from a type tag to a function, built once per
//! aggregate type and shared by every instance of it. They hold no domain
//! state. Registering a tag twice replaces the earlier entry.

use std::collections::HashMap;
use std::fmt;

use crate::command::Command;
use crate::error::DomainError;
use crate::event::DomainEvent;

/// Function turning a command into zero or more events, given the current state.
pub type CommandHandlerFn<S, C, E> =
    Box<dyn Fn(&S, &C) -> Result<Vec<E>, DomainError> + Send + Sync>;

/// Function mutating state in response to one event.
pub type EventApplierFn<S, E> = Box<dyn Fn(&mut S, &E) + Send + Sync>;

/// Registry mapping command type tags to handlers.
pub struct CommandHandlers<S, C, E> {
    handlers: HashMap<String, CommandHandlerFn<S, C, E>>,
}

impl<S, C, E> CommandHandlers<S, C, E>
where
    C: Command,
    E: DomainEvent,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for `command_type`, replacing any previous one.
    pub fn register<F>(&mut self, command_type: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&S, &C) -> Result<Vec<E>, DomainError> + Send + Sync + 'static,
    {
        self.handlers.insert(command_type.into(), Box::new(handler));
        self
    }

    /// Routes `command` to its handler.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CommandHandlerNotFound` if no handler is
    /// registered for the command type, or whatever the handler returns.
    pub fn handle(&self, state: &S, command: &C) -> Result<Vec<E>, DomainError> {
        let command_type = command.command_type();
        let handler =
            self.handlers
                .get(command_type)
                .ok_or_else(|| DomainError::CommandHandlerNotFound {
                    command_type: command_type.to_owned(),
                })?;
        handler(state, command)
    }

    /// Returns `true` if a handler is registered for `command_type`.
    #[must_use]
    pub fn contains(&self, command_type: &str) -> bool {
        self.handlers.contains_key(command_type)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<S, C, E> Default for CommandHandlers<S, C, E>
where
    C: Command,
    E: DomainEvent,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C, E> fmt::Debug for CommandHandlers<S, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// Registry mapping event type tags to appliers.
pub struct EventAppliers<S, E> {
    appliers: HashMap<String, EventApplierFn<S, E>>,
}

impl<S, E> EventAppliers<S, E>
where
    E: DomainEvent,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            appliers: HashMap::new(),
        }
    }

    /// Registers `applier` for `event_type`, replacing any previous one.
    pub fn register<F>(&mut self, event_type: impl Into<String>, applier: F) -> &mut Self
    where
        F: Fn(&mut S, &E) + Send + Sync + 'static,
    {
        self.appliers.insert(event_type.into(), Box::new(applier));
        self
    }

    /// Applies `events` in order, all or nothing.
    ///
    /// Every applier is resolved before the first one runs, so a missing
    /// applier anywhere in the batch leaves the state untouched.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventApplierNotFound` for the first event whose
    /// type has no applier.
    pub fn apply_all(&self, state: &mut S, events: &[E]) -> Result<(), DomainError> {
        let appliers = events
            .iter()
            .map(|event| self.resolve(event))
            .collect::<Result<Vec<_>, _>>()?;

        for (applier, event) in appliers.into_iter().zip(events) {
            applier(state, event);
        }
        Ok(())
    }

    /// Returns `true` if an applier is registered for `event_type`.
    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.appliers.contains_key(event_type)
    }

    /// Number of registered appliers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.appliers.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.appliers.is_empty()
    }

    fn resolve(&self, event: &E) -> Result<&EventApplierFn<S, E>, DomainError> {
        let event_type = event.event_type();
        self.appliers
            .get(event_type)
            .ok_or_else(|| DomainError::EventApplierNotFound {
                event_type: event_type.to_owned(),
            })
    }
}

impl<S, E> Default for EventAppliers<S, E>
where
    E: DomainEvent,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> fmt::Debug for EventAppliers<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.appliers.keys()).finish()
    }
}

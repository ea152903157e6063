//! Aggregate factory.
//!
//! Maps aggregate type tags to constructors. The factory is an ordinary
//! value handed to whoever needs it; there is no process-wide registry.

use std::collections::HashMap;
use std::fmt;

use crate::aggregate::BoxedAggregate;
use crate::command::Command;
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::identifier::AggregateId;

/// Constructor producing a fresh, unhydrated aggregate for an identifier.
pub type AggregateConstructor<C, E> = Box<dyn Fn(AggregateId) -> BoxedAggregate<C, E> + Send + Sync>;

/// Registry of aggregate constructors keyed by aggregate type tag.
pub struct AggregateFactory<C, E> {
    constructors: HashMap<String, AggregateConstructor<C, E>>,
}

impl<C, E> AggregateFactory<C, E>
where
    C: Command,
    E: DomainEvent,
{
    /// Creates an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registers `constructor` for `aggregate_type`, replacing any previous one.
    pub fn register<F>(&mut self, aggregate_type: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(AggregateId) -> BoxedAggregate<C, E> + Send + Sync + 'static,
    {
        self.constructors
            .insert(aggregate_type.into(), Box::new(constructor));
        self
    }

    /// Builds a fresh aggregate of `aggregate_type` at version 0.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotRegistered` if no constructor is
    /// registered for the type.
    pub fn create(
        &self,
        aggregate_type: &str,
        aggregate_id: AggregateId,
    ) -> Result<BoxedAggregate<C, E>, DomainError> {
        let constructor = self
            .constructors
            .get(aggregate_type)
            .ok_or_else(|| DomainError::AggregateNotRegistered(aggregate_type.to_owned()))?;
        Ok(constructor(aggregate_id))
    }

    /// Returns `true` if a constructor is registered for `aggregate_type`.
    #[must_use]
    pub fn is_registered(&self, aggregate_type: &str) -> bool {
        self.constructors.contains_key(aggregate_type)
    }
}

impl<C, E> Default for AggregateFactory<C, E>
where
    C: Command,
    E: DomainEvent,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> fmt::Debug for AggregateFactory<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateFactory")
            .field("aggregate_types", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

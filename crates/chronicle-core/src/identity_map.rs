//! Per-session identity map of loaded aggregates.

use std::fmt;

use crate::aggregate::{AggregateRoot, BoxedAggregate};
use crate::command::Command;
use crate::event::DomainEvent;
use crate::identifier::AggregateId;

/// Holds at most one in-memory instance per aggregate id, in the order the
/// aggregates were first tracked.
pub struct IdentityMap<C, E> {
    entries: Vec<BoxedAggregate<C, E>>,
}

impl<C, E> IdentityMap<C, E>
where
    C: Command,
    E: DomainEvent,
{
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the tracked aggregate with `aggregate_id`.
    #[must_use]
    pub fn get(&self, aggregate_id: AggregateId) -> Option<&dyn AggregateRoot<C, E>> {
        self.position(aggregate_id)
            .map(|index| self.entries[index].as_ref())
    }

    /// Returns the tracked aggregate with `aggregate_id`, mutably.
    pub fn get_mut(&mut self, aggregate_id: AggregateId) -> Option<&mut dyn AggregateRoot<C, E>> {
        let index = self.position(aggregate_id)?;
        let aggregate: &mut dyn AggregateRoot<C, E> = self.entries[index].as_mut();
        Some(aggregate)
    }

    /// Tracks `aggregate`, returning the instance it replaced if one with the
    /// same id was already tracked. A replacement keeps its original position.
    pub fn insert(&mut self, aggregate: BoxedAggregate<C, E>) -> Option<BoxedAggregate<C, E>> {
        match self.position(aggregate.aggregate_id()) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index], aggregate)),
            None => {
                self.entries.push(aggregate);
                None
            }
        }
    }

    /// Stops tracking `aggregate_id`, returning the evicted instance.
    pub fn remove(&mut self, aggregate_id: AggregateId) -> Option<BoxedAggregate<C, E>> {
        let index = self.position(aggregate_id)?;
        Some(self.entries.remove(index))
    }

    /// Returns `true` if `aggregate_id` is tracked.
    #[must_use]
    pub fn contains(&self, aggregate_id: AggregateId) -> bool {
        self.position(aggregate_id).is_some()
    }

    /// Number of tracked aggregates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates mutably over tracked aggregates in tracking order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut dyn AggregateRoot<C, E>> + '_ {
        self.entries
            .iter_mut()
            .map(|aggregate| aggregate.as_mut() as &mut dyn AggregateRoot<C, E>)
    }

    /// Evicts every tracked aggregate.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Evicts every tracked aggregate, yielding them in tracking order.
    pub fn drain(&mut self) -> impl Iterator<Item = BoxedAggregate<C, E>> + '_ {
        self.entries.drain(..)
    }

    fn position(&self, aggregate_id: AggregateId) -> Option<usize> {
        self.entries
            .iter()
            .position(|aggregate| aggregate.aggregate_id() == aggregate_id)
    }
}

impl<C, E> Default for IdentityMap<C, E>
where
    C: Command,
    E: DomainEvent,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> fmt::Debug for IdentityMap<C, E>
where
    C: Command,
    E: DomainEvent,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|aggregate| aggregate.aggregate_id()))
            .finish()
    }
}

//! Synchronous in-process event bus.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::handler::EventHandler;

/// Port for publishing committed events to subscribers.
pub trait EventPublisher<E: DomainEvent>: Send + Sync {
    /// Publishes `events` in order.
    ///
    /// # Errors
    ///
    /// Returns the first subscriber error; remaining deliveries are skipped.
    fn publish(&self, events: &[E]) -> Result<(), DomainError>;
}

impl<E, T> EventPublisher<E> for Arc<T>
where
    E: DomainEvent,
    T: EventPublisher<E> + ?Sized,
{
    fn publish(&self, events: &[E]) -> Result<(), DomainError> {
        (**self).publish(events)
    }
}

/// Set of event handlers with synchronous, fail-fast fan-out.
///
/// Handlers are identified by their `Arc` allocation: registering the same
/// `Arc` twice is a no-op, and deregistering only removes that allocation.
pub struct EventBus<E> {
    handlers: RwLock<Vec<Arc<dyn EventHandler<E>>>>,
}

impl<E: DomainEvent> EventBus<E> {
    /// Creates a bus with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Adds `handler`. Returns `false` if it was already registered.
    pub fn register(&self, handler: Arc<dyn EventHandler<E>>) -> bool {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if handlers
            .iter()
            .any(|existing| std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(&handler)))
        {
            return false;
        }
        handlers.push(handler);
        true
    }

    /// Removes `handler`. Returns `false` if it was not registered.
    pub fn deregister<H>(&self, handler: &Arc<H>) -> bool
    where
        H: EventHandler<E> + ?Sized,
    {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|existing| !std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(handler)));
        handlers.len() != before
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn snapshot(&self) -> Vec<Arc<dyn EventHandler<E>>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<E: DomainEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DomainEvent> EventPublisher<E> for EventBus<E> {
    fn publish(&self, events: &[E]) -> Result<(), DomainError> {
        // The lock is released before any handler runs, so handlers may
        // register or deregister without deadlocking.
        let handlers = self.snapshot();
        for event in events {
            let event_type = event.event_type();
            for handler in &handlers {
                if !handler.subscribed_to().matches(event_type) {
                    continue;
                }
                if let Err(err) = handler.handle(event) {
                    warn!(event_type, error = %err, "event handler failed, publish aborted");
                    return Err(err);
                }
            }
        }
        debug!(
            events = events.len(),
            handlers = handlers.len(),
            "events published"
        );
        Ok(())
    }
}

impl<E: DomainEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

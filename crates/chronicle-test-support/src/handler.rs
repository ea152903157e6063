//! Test subscribers and publishers.

use std::sync::Mutex;

use chronicle_core::bus::EventPublisher;
use chronicle_core::error::DomainError;
use chronicle_core::event::{DomainEvent, EventMatcher};
use chronicle_core::handler::EventHandler;

/// An event handler that records every event it is offered.
#[derive(Debug)]
pub struct RecordingEventHandler<E> {
    matcher: EventMatcher,
    received: Mutex<Vec<E>>,
}

impl<E: DomainEvent> RecordingEventHandler<E> {
    /// Create a handler subscribed to the events `matcher` accepts.
    #[must_use]
    pub fn new(matcher: EventMatcher) -> Self {
        Self {
            matcher,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of the events received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn received(&self) -> Vec<E> {
        self.received.lock().unwrap().clone()
    }
}

impl<E: DomainEvent> EventHandler<E> for RecordingEventHandler<E> {
    fn subscribed_to(&self) -> EventMatcher {
        self.matcher.clone()
    }

    fn handle(&self, event: &E) -> Result<(), DomainError> {
        self.received.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// An event handler that fails on every event it is offered.
#[derive(Debug)]
pub struct FailingEventHandler {
    matcher: EventMatcher,
}

impl FailingEventHandler {
    /// Create a failing handler subscribed to the events `matcher` accepts.
    #[must_use]
    pub fn new(matcher: EventMatcher) -> Self {
        Self { matcher }
    }
}

impl<E: DomainEvent> EventHandler<E> for FailingEventHandler {
    fn subscribed_to(&self) -> EventMatcher {
        self.matcher.clone()
    }

    fn handle(&self, event: &E) -> Result<(), DomainError> {
        Err(DomainError::EventHandler {
            handler: "failing".into(),
            reason: format!("refused {}", event.event_type()),
        })
    }
}

/// A publisher that records every published batch.
#[derive(Debug)]
pub struct RecordingPublisher<E> {
    published: Mutex<Vec<Vec<E>>>,
}

impl<E: DomainEvent> RecordingPublisher<E> {
    /// Create a publisher with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every published batch, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn batches(&self) -> Vec<Vec<E>> {
        self.published.lock().unwrap().clone()
    }

    /// Returns every published event, flattened in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<E> {
        self.published.lock().unwrap().concat()
    }
}

impl<E: DomainEvent> Default for RecordingPublisher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DomainEvent> EventPublisher<E> for RecordingPublisher<E> {
    fn publish(&self, events: &[E]) -> Result<(), DomainError> {
        self.published.lock().unwrap().push(events.to_vec());
        Ok(())
    }
}

/// A publisher that always fails.
#[derive(Debug)]
pub struct FailingPublisher;

impl<E: DomainEvent> EventPublisher<E> for FailingPublisher {
    fn publish(&self, _events: &[E]) -> Result<(), DomainError> {
        Err(DomainError::EventHandler {
            handler: "failing publisher".into(),
            reason: "subscriber unavailable".into(),
        })
    }
}

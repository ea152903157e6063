//! Event handlers (subscribers).

use std::collections::HashMap;
use std::fmt;

use crate::error::DomainError;
use crate::event::{DomainEvent, EventMatcher};

/// A subscriber reacting to published events.
pub trait EventHandler<E: DomainEvent>: Send + Sync {
    /// Declares which event types this handler receives.
    fn subscribed_to(&self) -> EventMatcher;

    /// Handles one event. Only called for events accepted by `subscribed_to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler cannot process the event; the bus
    /// stops publishing at the first such error.
    fn handle(&self, event: &E) -> Result<(), DomainError>;
}

type RouteFn<E> = Box<dyn Fn(&E) -> Result<(), DomainError> + Send + Sync>;

/// Event handler that routes each event type to its own function.
///
/// The subscription is derived from the registered routes, so the handler is
/// only offered events it knows how to handle.
pub struct RoutedEventHandler<E> {
    name: String,
    routes: HashMap<String, RouteFn<E>>,
}

impl<E: DomainEvent> RoutedEventHandler<E> {
    /// Creates a handler with no routes. `name` appears in error reports.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: HashMap::new(),
        }
    }

    /// Routes `event_type` to `route`, replacing any previous route.
    pub fn on<F>(&mut self, event_type: impl Into<String>, route: F) -> &mut Self
    where
        F: Fn(&E) -> Result<(), DomainError> + Send + Sync + 'static,
    {
        self.routes.insert(event_type.into(), Box::new(route));
        self
    }

    /// Returns the handler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<E: DomainEvent> EventHandler<E> for RoutedEventHandler<E> {
    fn subscribed_to(&self) -> EventMatcher {
        EventMatcher::any_of(self.routes.keys().cloned())
    }

    fn handle(&self, event: &E) -> Result<(), DomainError> {
        let event_type = event.event_type();
        let route = self
            .routes
            .get(event_type)
            .ok_or_else(|| DomainError::EventHandler {
                handler: self.name.clone(),
                reason: format!("no route for event type {event_type}"),
            })?;
        route(event)
    }
}

impl<E> fmt::Debug for RoutedEventHandler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutedEventHandler")
            .field("name", &self.name)
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone)]
    enum LedgerEvent {
        Credited(i64),
        Debited(i64),
        Frozen,
    }

    impl DomainEvent for LedgerEvent {
        fn event_type(&self) -> &'static str {
            match self {
                Self::Credited(_) => "Credited",
                Self::Debited(_) => "Debited",
                Self::Frozen => "Frozen",
            }
        }
    }

    fn ledger_handler(total: Arc<Mutex<i64>>) -> RoutedEventHandler<LedgerEvent> {
        let credit_total = Arc::clone(&total);
        let mut handler = RoutedEventHandler::new("ledger");
        handler
            .on("Credited", move |event| {
                if let LedgerEvent::Credited(amount) = event {
                    *credit_total.lock().unwrap() += amount;
                }
                Ok(())
            })
            .on("Debited", move |event| {
                if let LedgerEvent::Debited(amount) = event {
                    *total.lock().unwrap() -= amount;
                }
                Ok(())
            });
        handler
    }

    #[test]
    fn test_subscription_is_derived_from_routes() {
        let handler = ledger_handler(Arc::new(Mutex::new(0)));

        let matcher = handler.subscribed_to();

        assert!(matcher.matches("Credited"));
        assert!(matcher.matches("Debited"));
        assert!(!matcher.matches("Frozen"));
    }

    #[test]
    fn test_handle_dispatches_to_route() {
        // Arrange
        let total = Arc::new(Mutex::new(0));
        let handler = ledger_handler(Arc::clone(&total));

        // Act
        handler.handle(&LedgerEvent::Credited(50)).unwrap();
        handler.handle(&LedgerEvent::Debited(20)).unwrap();

        // Assert
        assert_eq!(*total.lock().unwrap(), 30);
    }

    #[test]
    fn test_handle_unrouted_event_returns_event_handler_error() {
        let handler = ledger_handler(Arc::new(Mutex::new(0)));

        let result = handler.handle(&LedgerEvent::Frozen);

        match result {
            Err(DomainError::EventHandler { handler, reason }) => {
                assert_eq!(handler, "ledger");
                assert!(reason.contains("Frozen"));
            }
            other => panic!("expected EventHandler error, got {other:?}"),
        }
    }

    #[test]
    fn test_handler_with_no_routes_subscribes_to_nothing() {
        let handler: RoutedEventHandler<LedgerEvent> = RoutedEventHandler::new("idle");

        assert!(!handler.subscribed_to().matches("Credited"));
        assert_eq!(handler.name(), "idle");
    }
}

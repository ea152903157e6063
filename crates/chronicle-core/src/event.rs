//! Domain event abstractions.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Trait that all domain events implement.
///
/// An event's position in its stream is implicit and never stored on the
/// event itself.
pub trait DomainEvent: Clone + Send + Sync + fmt::Debug + 'static {
    /// Returns the event type tag (used for applier and subscriber routing).
    fn event_type(&self) -> &'static str;
}

/// Predicate over an event type tag, used by subscribers to declare which
/// events they want to receive.
#[derive(Clone)]
pub struct EventMatcher(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl EventMatcher {
    /// Matches every event.
    #[must_use]
    pub fn any() -> Self {
        Self::from_fn(|_| true)
    }

    /// Matches no event.
    #[must_use]
    pub fn none() -> Self {
        Self::from_fn(|_| false)
    }

    /// Matches exactly one event type.
    #[must_use]
    pub fn event(event_type: impl Into<String>) -> Self {
        let event_type = event_type.into();
        Self::from_fn(move |candidate| candidate == event_type)
    }

    /// Matches any of the given event types. An empty set matches nothing.
    #[must_use]
    pub fn any_of<I, T>(event_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let event_types: HashSet<String> = event_types.into_iter().map(Into::into).collect();
        Self::from_fn(move |candidate| event_types.contains(candidate))
    }

    /// Wraps an arbitrary predicate.
    pub fn from_fn(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Returns `true` if the event type tag is accepted.
    #[must_use]
    pub fn matches(&self, event_type: &str) -> bool {
        (self.0)(event_type)
    }

    /// Returns `true` if the event's type tag is accepted.
    #[must_use]
    pub fn matches_event<E: DomainEvent>(&self, event: &E) -> bool {
        self.matches(event.event_type())
    }
}

impl fmt::Debug for EventMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventMatcher").finish_non_exhaustive()
    }
}

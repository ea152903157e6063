//! Given/When/Then scenarios for aggregates.
//!
//! ```ignore
//! Scenario::given(Box::new(new_test_aggregate(id)), &[TestEvent::SomethingHappened])
//!     .when(&TestCommand::MakeSomethingHappen(id))
//!     .then_fail_with(|err| matches!(err, DomainError::Validation(_)));
//! ```

use chronicle_core::aggregate::BoxedAggregate;
use chronicle_core::command::Command;
use chronicle_core::error::DomainError;
use chronicle_core::event::DomainEvent;

/// An aggregate hydrated from a given history, waiting for a command.
pub struct Scenario<C, E> {
    aggregate: BoxedAggregate<C, E>,
    given: Result<(), DomainError>,
}

impl<C, E> Scenario<C, E>
where
    C: Command,
    E: DomainEvent + PartialEq,
{
    /// Replays `history` into `aggregate`. A replay error is carried into the
    /// outcome instead of running the command.
    #[must_use]
    pub fn given(mut aggregate: BoxedAggregate<C, E>, history: &[E]) -> Self {
        let given = aggregate.load_from_history(history);
        Self { aggregate, given }
    }

    /// Handles `command` on the hydrated aggregate.
    #[must_use]
    pub fn when(mut self, command: &C) -> Outcome<C, E> {
        let result = match self.given {
            Ok(()) => self.aggregate.handle(command),
            Err(err) => Err(err),
        };
        Outcome {
            aggregate: self.aggregate,
            result,
        }
    }
}

/// Result of a scenario's command, ready for assertions.
pub struct Outcome<C, E> {
    aggregate: BoxedAggregate<C, E>,
    result: Result<Vec<E>, DomainError>,
}

impl<C, E> Outcome<C, E>
where
    C: Command,
    E: DomainEvent + PartialEq,
{
    /// Asserts the command produced exactly `expected`, in order, and returns
    /// the aggregate for further inspection.
    ///
    /// # Panics
    ///
    /// Panics if the command failed or produced different events.
    #[track_caller]
    pub fn then(self, expected: &[E]) -> BoxedAggregate<C, E> {
        match self.result {
            Ok(events) => assert_eq!(events, expected, "unexpected events"),
            Err(err) => panic!("expected events {expected:?}, got error: {err}"),
        }
        self.aggregate
    }

    /// Asserts the command failed with an error accepted by `predicate`, and
    /// returns the aggregate for further inspection.
    ///
    /// # Panics
    ///
    /// Panics if the command succeeded or `predicate` rejects the error.
    #[track_caller]
    pub fn then_fail_with(self, predicate: impl FnOnce(&DomainError) -> bool) -> BoxedAggregate<C, E> {
        match self.result {
            Ok(events) => panic!("expected an error, got events {events:?}"),
            Err(err) => assert!(predicate(&err), "unexpected error: {err:?}"),
        }
        self.aggregate
    }
}

#[cfg(test)]
mod tests {
    use chronicle_core::aggregate::AggregateRoot;
    use chronicle_core::identifier::AggregateId;

    use super::*;
    use crate::aggregate::{
        TestCommand, TestEvent, TestState, new_test_aggregate, test_aggregate_with,
        test_command_handlers,
    };
    use chronicle_core::registry::EventAppliers;

    #[test]
    fn test_then_returns_aggregate_with_pending_events() {
        let id = AggregateId::new();

        let aggregate = Scenario::given(Box::new(new_test_aggregate(id)), &[])
            .when(&TestCommand::MakeSomethingHappen(id))
            .then(&[TestEvent::SomethingHappened]);

        assert_eq!(aggregate.uncommitted_changes(), &[TestEvent::SomethingHappened]);
        assert_eq!(aggregate.version(), 0);
    }

    #[test]
    fn test_business_rule_violation_after_history() {
        let id = AggregateId::new();

        let aggregate = Scenario::given(
            Box::new(new_test_aggregate(id)),
            &[TestEvent::SomethingHappened],
        )
        .when(&TestCommand::MakeSomethingHappen(id))
        .then_fail_with(|err| matches!(err, DomainError::Validation(_)));

        assert_eq!(aggregate.version(), 1);
        assert!(aggregate.uncommitted_changes().is_empty());
    }

    #[test]
    fn test_given_replay_error_is_reported_by_outcome() {
        let id = AggregateId::new();
        let aggregate = test_aggregate_with(id, test_command_handlers(), EventAppliers::new());

        let aggregate = Scenario::given(Box::new(aggregate), &[TestEvent::SomethingHappened])
            .when(&TestCommand::MakeSomethingHappen(id))
            .then_fail_with(|err| matches!(err, DomainError::EventApplierNotFound { .. }));

        assert_eq!(aggregate.state::<TestState>(), Some(&TestState::default()));
    }

    #[test]
    #[should_panic(expected = "unexpected events")]
    fn test_then_panics_on_mismatch() {
        let id = AggregateId::new();

        Scenario::given(Box::new(new_test_aggregate(id)), &[])
            .when(&TestCommand::MakeSomethingElseHappen(id))
            .then(&[TestEvent::SomethingHappened]);
    }
}

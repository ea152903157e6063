//! A minimal aggregate with no external dependencies, used across tests.

use std::sync::Arc;

use chronicle_core::aggregate::EventSourced;
use chronicle_core::command::Command;
use chronicle_core::error::DomainError;
use chronicle_core::event::DomainEvent;
use chronicle_core::factory::AggregateFactory;
use chronicle_core::identifier::AggregateId;
use chronicle_core::registry::{CommandHandlers, EventAppliers};

/// Aggregate type tag of the test aggregate.
pub const TEST_AGGREGATE_TYPE: &str = "test.TestAggregate";

/// Commands accepted by the test aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCommand {
    /// Produces `SomethingHappened`; rejected once it has already happened.
    MakeSomethingHappen(AggregateId),
    /// Produces `SomethingElseHappened`, any number of times.
    MakeSomethingElseHappen(AggregateId),
    /// Produces `SomethingHappened` followed by `SomethingUnhandled`, which
    /// has no applier.
    MakeSomethingWeirdHappen(AggregateId),
    /// Has no registered handler.
    DoSomethingUnknown(AggregateId),
}

impl Command for TestCommand {
    fn aggregate_id(&self) -> AggregateId {
        match self {
            Self::MakeSomethingHappen(id)
            | Self::MakeSomethingElseHappen(id)
            | Self::MakeSomethingWeirdHappen(id)
            | Self::DoSomethingUnknown(id) => *id,
        }
    }

    fn aggregate_type(&self) -> &'static str {
        TEST_AGGREGATE_TYPE
    }

    fn command_type(&self) -> &'static str {
        match self {
            Self::MakeSomethingHappen(_) => "MakeSomethingHappen",
            Self::MakeSomethingElseHappen(_) => "MakeSomethingElseHappen",
            Self::MakeSomethingWeirdHappen(_) => "MakeSomethingWeirdHappen",
            Self::DoSomethingUnknown(_) => "DoSomethingUnknown",
        }
    }
}

/// Events produced by the test aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestEvent {
    /// Something happened.
    SomethingHappened,
    /// Something else happened.
    SomethingElseHappened,
    /// An event no applier is registered for.
    SomethingUnhandled,
}

impl DomainEvent for TestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::SomethingHappened => "SomethingHappened",
            Self::SomethingElseHappened => "SomethingElseHappened",
            Self::SomethingUnhandled => "SomethingUnhandled",
        }
    }
}

/// Domain state of the test aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestState {
    /// Whether `SomethingHappened` has been applied.
    pub already_happened: bool,
    /// How many `SomethingElseHappened` events have been applied.
    pub something_else_count: u32,
}

/// The test aggregate.
pub type TestAggregate = EventSourced<TestState, TestCommand, TestEvent>;

/// Command handlers of the test aggregate.
#[must_use]
pub fn test_command_handlers() -> CommandHandlers<TestState, TestCommand, TestEvent> {
    let mut handlers = CommandHandlers::new();
    handlers
        .register("MakeSomethingHappen", |state: &TestState, _: &TestCommand| {
            if state.already_happened {
                return Err(DomainError::Validation("it can happen once only".into()));
            }
            Ok(vec![TestEvent::SomethingHappened])
        })
        .register("MakeSomethingElseHappen", |_, _| {
            Ok(vec![TestEvent::SomethingElseHappened])
        })
        .register("MakeSomethingWeirdHappen", |_, _| {
            Ok(vec![TestEvent::SomethingHappened, TestEvent::SomethingUnhandled])
        });
    handlers
}

/// Event appliers of the test aggregate.
#[must_use]
pub fn test_event_appliers() -> EventAppliers<TestState, TestEvent> {
    let mut appliers = EventAppliers::new();
    appliers
        .register("SomethingHappened", |state: &mut TestState, _: &TestEvent| {
            state.already_happened = true;
        })
        .register("SomethingElseHappened", |state: &mut TestState, _: &TestEvent| {
            state.something_else_count += 1;
        });
    appliers
}

/// Builds a test aggregate around the given registries, so tests can wire in
/// empty or partial ones.
#[must_use]
pub fn test_aggregate_with(
    id: AggregateId,
    handlers: CommandHandlers<TestState, TestCommand, TestEvent>,
    appliers: EventAppliers<TestState, TestEvent>,
) -> TestAggregate {
    EventSourced::new(
        id,
        TEST_AGGREGATE_TYPE,
        TestState::default(),
        Arc::new(handlers),
        Arc::new(appliers),
    )
}

/// Builds a fully wired test aggregate at version 0.
#[must_use]
pub fn new_test_aggregate(id: AggregateId) -> TestAggregate {
    test_aggregate_with(id, test_command_handlers(), test_event_appliers())
}

/// Factory with the test aggregate registered under `TEST_AGGREGATE_TYPE`.
#[must_use]
pub fn test_factory() -> AggregateFactory<TestCommand, TestEvent> {
    let handlers = Arc::new(test_command_handlers());
    let appliers = Arc::new(test_event_appliers());
    let mut factory = AggregateFactory::new();
    factory.register(TEST_AGGREGATE_TYPE, move |id| {
        Box::new(EventSourced::new(
            id,
            TEST_AGGREGATE_TYPE,
            TestState::default(),
            Arc::clone(&handlers),
            Arc::clone(&appliers),
        ))
    });
    factory
}

//! Shared test doubles, fixtures and the aggregate scenario DSL for Chronicle.

mod aggregate;
mod handler;
mod scenario;
mod store;

pub use aggregate::{
    TEST_AGGREGATE_TYPE, TestAggregate, TestCommand, TestEvent, TestState, new_test_aggregate,
    test_aggregate_with, test_command_handlers, test_event_appliers, test_factory,
};
pub use handler::{FailingEventHandler, FailingPublisher, RecordingEventHandler, RecordingPublisher};
pub use scenario::{Outcome, Scenario};
pub use store::{AppendCall, FailingEventStore, RecordingEventStore};

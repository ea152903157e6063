//! Integration tests for `Dispatcher`.

use std::sync::Arc;

use chronicle_core::bus::{EventBus, EventPublisher};
use chronicle_core::dispatcher::Dispatcher;
use chronicle_core::error::DomainError;
use chronicle_core::event::EventMatcher;
use chronicle_core::identifier::AggregateId;
use chronicle_core::repository::{AggregateRepository, EventSourcedRepository};
use chronicle_core::store::EventStore;
use chronicle_event_store::InMemoryEventStore;
use chronicle_test_support::{
    FailingEventHandler, FailingEventStore, FailingPublisher, RecordingEventHandler,
    RecordingPublisher, TestCommand, TestEvent, test_factory,
};

struct Fixture {
    store: Arc<InMemoryEventStore<TestEvent>>,
    publisher: Arc<RecordingPublisher<TestEvent>>,
    dispatcher: Dispatcher<TestCommand, TestEvent>,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryEventStore::<TestEvent>::new());
    let publisher = Arc::new(RecordingPublisher::new());
    let repository: Arc<dyn AggregateRepository<TestCommand, TestEvent>> = Arc::new(
        EventSourcedRepository::new(Arc::new(test_factory()), store.clone()),
    );
    let dispatcher = Dispatcher::builder()
        .repository(repository)
        .publisher(publisher.clone())
        .build()
        .unwrap();
    Fixture {
        store,
        publisher,
        dispatcher,
    }
}

#[test]
fn test_handle_stores_and_publishes_produced_events() {
    // Arrange
    let fixture = fixture();
    let id = AggregateId::new();

    // Act
    let events = fixture
        .dispatcher
        .handle(&TestCommand::MakeSomethingHappen(id))
        .unwrap();

    // Assert
    assert_eq!(events, vec![TestEvent::SomethingHappened]);
    assert_eq!(fixture.store.load_stream(id).unwrap(), events);
    assert_eq!(fixture.publisher.batches(), vec![events]);
}

#[test]
fn test_successive_commands_extend_the_stream() {
    let fixture = fixture();
    let id = AggregateId::new();

    fixture
        .dispatcher
        .handle(&TestCommand::MakeSomethingHappen(id))
        .unwrap();
    fixture
        .dispatcher
        .handle(&TestCommand::MakeSomethingElseHappen(id))
        .unwrap();

    assert_eq!(fixture.store.stream_version(id).unwrap(), 2);
    assert_eq!(
        fixture.publisher.published(),
        vec![TestEvent::SomethingHappened, TestEvent::SomethingElseHappened]
    );
}

#[test]
fn test_rejected_command_stores_and_publishes_nothing() {
    // Arrange
    let fixture = fixture();
    let id = AggregateId::new();
    fixture
        .dispatcher
        .handle(&TestCommand::MakeSomethingHappen(id))
        .unwrap();

    // Act
    let result = fixture
        .dispatcher
        .handle(&TestCommand::MakeSomethingHappen(id));

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(fixture.store.stream_version(id).unwrap(), 1);
    assert_eq!(fixture.publisher.batches().len(), 1);
}

#[test]
fn test_unknown_command_returns_command_handler_not_found() {
    let fixture = fixture();
    let id = AggregateId::new();

    let result = fixture
        .dispatcher
        .handle(&TestCommand::DoSomethingUnknown(id));

    assert!(matches!(
        result,
        Err(DomainError::CommandHandlerNotFound { ref command_type }) if command_type == "DoSomethingUnknown"
    ));
    assert!(fixture.publisher.batches().is_empty());
}

#[test]
fn test_missing_applier_stores_nothing() {
    let fixture = fixture();
    let id = AggregateId::new();

    let result = fixture
        .dispatcher
        .handle(&TestCommand::MakeSomethingWeirdHappen(id));

    assert!(matches!(
        result,
        Err(DomainError::EventApplierNotFound { .. })
    ));
    assert!(fixture.store.load_stream(id).unwrap().is_empty());
}

#[test]
fn test_load_error_is_returned_verbatim() {
    let repository: Arc<dyn AggregateRepository<TestCommand, TestEvent>> = Arc::new(
        EventSourcedRepository::new(Arc::new(test_factory()), Arc::new(FailingEventStore)),
    );
    let dispatcher = Dispatcher::new(repository, Arc::new(RecordingPublisher::<TestEvent>::new()));

    let result = dispatcher.handle(&TestCommand::MakeSomethingHappen(AggregateId::new()));

    assert!(matches!(
        result,
        Err(DomainError::Infrastructure(ref message)) if message == "connection refused"
    ));
}

#[test]
fn test_publish_failure_is_reported_but_storage_is_kept() {
    // Arrange
    let store = Arc::new(InMemoryEventStore::<TestEvent>::new());
    let repository: Arc<dyn AggregateRepository<TestCommand, TestEvent>> = Arc::new(
        EventSourcedRepository::new(Arc::new(test_factory()), store.clone()),
    );
    let dispatcher = Dispatcher::new(repository, Arc::new(FailingPublisher));
    let id = AggregateId::new();

    // Act
    let result = dispatcher.handle(&TestCommand::MakeSomethingHappen(id));

    // Assert
    assert!(matches!(result, Err(DomainError::EventHandler { .. })));
    assert_eq!(
        store.load_stream(id).unwrap(),
        vec![TestEvent::SomethingHappened]
    );
}

#[test]
fn test_dispatch_through_event_bus_reaches_matching_subscribers_only() {
    // Arrange
    let bus = Arc::new(EventBus::<TestEvent>::new());
    let interested = Arc::new(RecordingEventHandler::<TestEvent>::new(EventMatcher::event(
        "SomethingHappened",
    )));
    let uninterested = Arc::new(RecordingEventHandler::<TestEvent>::new(EventMatcher::none()));
    bus.register(interested.clone());
    bus.register(uninterested.clone());
    let repository: Arc<dyn AggregateRepository<TestCommand, TestEvent>> = Arc::new(
        EventSourcedRepository::new(
            Arc::new(test_factory()),
            Arc::new(InMemoryEventStore::<TestEvent>::new()),
        ),
    );
    let publisher: Arc<dyn EventPublisher<TestEvent>> = bus;
    let dispatcher = Dispatcher::new(repository, publisher);
    let id = AggregateId::new();

    // Act
    dispatcher
        .handle(&TestCommand::MakeSomethingHappen(id))
        .unwrap();
    dispatcher
        .handle(&TestCommand::MakeSomethingElseHappen(id))
        .unwrap();

    // Assert
    assert_eq!(interested.received(), vec![TestEvent::SomethingHappened]);
    assert!(uninterested.received().is_empty());
}

#[test]
fn test_failing_subscriber_fails_the_dispatch() {
    let bus = Arc::new(EventBus::<TestEvent>::new());
    bus.register(Arc::new(FailingEventHandler::new(EventMatcher::any())));
    let repository: Arc<dyn AggregateRepository<TestCommand, TestEvent>> = Arc::new(
        EventSourcedRepository::new(
            Arc::new(test_factory()),
            Arc::new(InMemoryEventStore::<TestEvent>::new()),
        ),
    );
    let dispatcher = Dispatcher::new(repository, bus);

    let result = dispatcher.handle(&TestCommand::MakeSomethingHappen(AggregateId::new()));

    match result {
        Err(DomainError::EventHandler { handler, reason }) => {
            assert_eq!(handler, "failing");
            assert_eq!(reason, "refused SomethingHappened");
        }
        other => panic!("expected EventHandler error, got {other:?}"),
    }
}

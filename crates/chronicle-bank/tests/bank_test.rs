//! End-to-end tests: accounts driven through the dispatcher, stored in the
//! in-memory event store and projected onto statements through the bus.

use std::sync::{Arc, Mutex};

use chronicle_bank::application::projector::account_statement_projector;
use chronicle_bank::application::reporting::{
    AccountReporting, AccountStatement, InMemoryAccountReporter,
};
use chronicle_bank::domain::aggregates::{Account, register_account};
use chronicle_bank::domain::commands::{
    ACCOUNT_AGGREGATE_TYPE, AccountCommand, DepositMoney, OpenAccount, WithdrawMoney,
};
use chronicle_bank::domain::events::{AccountEvent, MoneyDeposited};
use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::bus::EventBus;
use chronicle_core::dispatcher::Dispatcher;
use chronicle_core::error::DomainError;
use chronicle_core::event::EventMatcher;
use chronicle_core::factory::AggregateFactory;
use chronicle_core::handler::EventHandler;
use chronicle_core::identifier::AggregateId;
use chronicle_core::middleware::{
    BoxedCommandHandler, CommandHandler, LoggingMiddleware, TransactionalMiddleware,
    with_middleware,
};
use chronicle_core::repository::{AggregateRepository, EventSourcedRepository};
use chronicle_core::store::EventStore;
use chronicle_core::unit_of_work::UnitOfWork;
use chronicle_event_store::InMemoryEventStore;
use chronicle_test_support::RecordingEventHandler;

struct Bank {
    store: Arc<InMemoryEventStore<AccountEvent>>,
    repository: Arc<dyn AggregateRepository<AccountCommand, AccountEvent>>,
    reporter: Arc<InMemoryAccountReporter>,
    bus: Arc<EventBus<AccountEvent>>,
    dispatcher: Dispatcher<AccountCommand, AccountEvent>,
}

fn bank() -> Bank {
    let mut factory = AggregateFactory::new();
    register_account(&mut factory);

    let store = Arc::new(InMemoryEventStore::<AccountEvent>::new());
    let repository: Arc<dyn AggregateRepository<AccountCommand, AccountEvent>> =
        Arc::new(EventSourcedRepository::new(Arc::new(factory), store.clone()));

    let reporter = Arc::new(InMemoryAccountReporter::new());
    let bus = Arc::new(EventBus::<AccountEvent>::new());
    bus.register(Arc::new(account_statement_projector(reporter.clone())));

    let dispatcher = Dispatcher::builder()
        .repository(repository.clone())
        .publisher(bus.clone())
        .build()
        .unwrap();

    Bank {
        store,
        repository,
        reporter,
        bus,
        dispatcher,
    }
}

fn open(account_id: AggregateId) -> AccountCommand {
    OpenAccount {
        account_id,
        number: "ACC777".into(),
    }
    .into()
}

fn deposit(account_id: AggregateId, amount: i64) -> AccountCommand {
    DepositMoney { account_id, amount }.into()
}

fn withdraw(account_id: AggregateId, amount: i64) -> AccountCommand {
    WithdrawMoney { account_id, amount }.into()
}

fn balance_of(bank: &Bank, account_id: AggregateId) -> i64 {
    let aggregate = bank
        .repository
        .load(account_id, ACCOUNT_AGGREGATE_TYPE)
        .unwrap();
    aggregate.state::<Account>().map_or(0, |account| account.balance)
}

#[test]
fn test_account_lifecycle_tracks_balances() {
    // Arrange
    let bank = bank();
    let account_id = AggregateId::new();

    // Act & Assert
    bank.dispatcher.handle(&open(account_id)).unwrap();
    bank.dispatcher.handle(&deposit(account_id, 1000)).unwrap();
    assert_eq!(balance_of(&bank, account_id), 1000);

    bank.dispatcher.handle(&withdraw(account_id, 100)).unwrap();
    assert_eq!(balance_of(&bank, account_id), 900);

    let before_last = bank
        .repository
        .load(account_id, ACCOUNT_AGGREGATE_TYPE)
        .unwrap();
    assert_eq!(before_last.version(), 3);

    bank.dispatcher.handle(&deposit(account_id, 500)).unwrap();
    assert_eq!(balance_of(&bank, account_id), 1400);

    let after_last = bank
        .repository
        .load(account_id, ACCOUNT_AGGREGATE_TYPE)
        .unwrap();
    assert_eq!(after_last.version(), 4);
    assert_eq!(bank.store.stream_version(account_id).unwrap(), 4);
}

#[test]
fn test_statement_is_projected_from_published_events() {
    // Arrange
    let bank = bank();
    let account_id = AggregateId::new();

    // Act
    for command in [
        open(account_id),
        deposit(account_id, 1000),
        withdraw(account_id, 100),
        deposit(account_id, 500),
    ] {
        bank.dispatcher.handle(&command).unwrap();
    }

    // Assert
    let statement = bank.reporter.account_details_for(account_id).unwrap();
    assert_eq!(statement.balance, 1400);
    assert_eq!(
        statement.to_string(),
        "Account #ACC777:\n\
         # |   Amount |  Balance\n\
         1 |  1000.00 |  1000.00\n\
         2 |  -100.00 |   900.00\n\
         3 |   500.00 |  1400.00\n"
    );
}

#[test]
fn test_rejected_command_stores_and_publishes_nothing() {
    // Arrange
    let bank = bank();
    let account_id = AggregateId::new();
    let recorder = Arc::new(RecordingEventHandler::<AccountEvent>::new(EventMatcher::any()));
    bank.bus.register(recorder.clone());
    bank.dispatcher.handle(&open(account_id)).unwrap();
    bank.dispatcher.handle(&deposit(account_id, 50)).unwrap();

    // Act
    let result = bank.dispatcher.handle(&withdraw(account_id, 51));

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(bank.store.stream_version(account_id).unwrap(), 2);
    assert_eq!(recorder.received().len(), 2);
    assert_eq!(
        bank.reporter.account_details_for(account_id).unwrap().balance,
        50
    );
}

#[test]
fn test_stale_append_is_a_concurrency_conflict() {
    // Arrange
    let bank = bank();
    let account_id = AggregateId::new();
    bank.dispatcher.handle(&open(account_id)).unwrap();
    let stale = AccountEvent::MoneyDeposited(MoneyDeposited {
        account_id,
        amount: 10,
        balance: 10,
    });

    // Act
    let result = bank.store.append(account_id, 0, &[stale]);

    // Assert
    assert!(matches!(
        result,
        Err(DomainError::ConcurrencyConflict {
            expected: 0,
            actual: 1,
            ..
        })
    ));
    assert_eq!(bank.store.stream_version(account_id).unwrap(), 1);
}

#[test]
fn test_accounts_are_independent() {
    let bank = bank();
    let first = AggregateId::new();
    let second = AggregateId::new();

    bank.dispatcher.handle(&open(first)).unwrap();
    bank.dispatcher.handle(&open(second)).unwrap();
    bank.dispatcher.handle(&deposit(first, 70)).unwrap();

    assert_eq!(balance_of(&bank, first), 70);
    assert_eq!(balance_of(&bank, second), 0);
    assert_eq!(
        bank.reporter.account_details_for(second).unwrap(),
        AccountStatement::opened(second, "ACC777")
    );
}

#[test]
fn test_projector_is_only_offered_account_events_it_routes() {
    let reporter = Arc::new(InMemoryAccountReporter::new());
    let projector = account_statement_projector(reporter);

    let matcher = projector.subscribed_to();

    assert!(matcher.matches("AccountOpened"));
    assert!(!matcher.matches("AccountClosed"));
}

#[test]
fn test_events_and_statements_serialize_to_json() {
    // Arrange
    let bank = bank();
    let account_id = AggregateId::new();
    bank.dispatcher.handle(&open(account_id)).unwrap();
    bank.dispatcher.handle(&deposit(account_id, 1000)).unwrap();
    let events = bank.store.load_stream(account_id).unwrap();
    let statement = bank.reporter.account_details_for(account_id).unwrap();

    // Act
    let json = serde_json::to_value(&events[1]).unwrap();
    let restored: Vec<AccountEvent> =
        serde_json::from_str(&serde_json::to_string(&events).unwrap()).unwrap();
    let restored_statement: AccountStatement =
        serde_json::from_str(&serde_json::to_string(&statement).unwrap()).unwrap();

    // Assert
    assert_eq!(json["type"], "MoneyDeposited");
    assert_eq!(json["payload"]["balance"], 1000);
    assert_eq!(restored, events);
    assert_eq!(restored_statement, statement);
}

#[test]
fn test_transactional_chain_commits_each_command() {
    // Arrange
    let bank = bank();
    let unit_of_work = Arc::new(Mutex::new(UnitOfWork::<AccountCommand, AccountEvent>::new(
        bank.repository.clone(),
        bank.bus.clone(),
    )));
    let transactional = TransactionalMiddleware::new(Arc::clone(&unit_of_work));
    let handler: BoxedCommandHandler<AccountCommand, AccountEvent> =
        Box::new(Arc::clone(&unit_of_work));
    let mut chain = with_middleware(handler, &[&LoggingMiddleware, &transactional]);
    let account_id = AggregateId::new();

    // Act
    chain.handle(&open(account_id)).unwrap();
    chain.handle(&deposit(account_id, 1000)).unwrap();
    let rejected = chain.handle(&withdraw(account_id, 5000));

    // Assert
    assert!(matches!(rejected, Err(DomainError::Validation(_))));
    assert_eq!(bank.store.stream_version(account_id).unwrap(), 2);
    assert_eq!(
        bank.reporter
            .account_details_for(account_id)
            .unwrap()
            .balance,
        1000
    );
    assert_eq!(unit_of_work.lock().unwrap().tracked_count(), 1);
}

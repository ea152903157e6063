//! Wires the runtime together and runs the account scenario.

use std::sync::Arc;

use chronicle_bank::application::projector::account_statement_projector;
use chronicle_bank::application::reporting::{
    AccountReporting, AccountStatement, InMemoryAccountReporter,
};
use chronicle_bank::domain::aggregates::register_account;
use chronicle_bank::domain::commands::{
    AccountCommand, DepositMoney, OpenAccount, WithdrawMoney,
};
use chronicle_bank::domain::events::AccountEvent;
use chronicle_core::bus::EventBus;
use chronicle_core::dispatcher::Dispatcher;
use chronicle_core::factory::AggregateFactory;
use chronicle_core::identifier::AggregateId;
use chronicle_core::middleware::{
    BoxedCommandHandler, CommandHandler, LoggingMiddleware, with_middleware,
};
use chronicle_core::repository::EventSourcedRepository;
use chronicle_event_store::InMemoryEventStore;

use crate::config::{Config, StatementFormat};
use crate::error::AppError;

/// The assembled runtime: a logged dispatcher writing to an in-memory store
/// and publishing to a bus that feeds the statement projector.
pub struct Bank {
    commands: BoxedCommandHandler<AccountCommand, AccountEvent>,
    reporter: Arc<InMemoryAccountReporter>,
}

impl Bank {
    /// Builds the runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Domain` if the dispatcher is missing a dependency.
    pub fn new() -> Result<Self, AppError> {
        let mut factory = AggregateFactory::new();
        register_account(&mut factory);

        let store = Arc::new(InMemoryEventStore::<AccountEvent>::new());
        let repository = Arc::new(EventSourcedRepository::new(Arc::new(factory), store));

        let reporter = Arc::new(InMemoryAccountReporter::new());
        let bus = Arc::new(EventBus::<AccountEvent>::new());
        bus.register(Arc::new(account_statement_projector(reporter.clone())));

        let dispatcher: BoxedCommandHandler<AccountCommand, AccountEvent> = Box::new(
            Dispatcher::builder()
                .repository(repository)
                .publisher(bus)
                .build()?,
        );
        let commands = with_middleware(dispatcher, &[&LoggingMiddleware]);

        Ok(Self { commands, reporter })
    }

    /// Dispatches `command`, returning how many events it produced.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Domain` with the dispatcher's error.
    pub fn execute(&mut self, command: &AccountCommand) -> Result<usize, AppError> {
        Ok(self.commands.handle(command)?.len())
    }

    /// Returns the projected statement of `account_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Domain` if no statement was projected.
    pub fn statement(&self, account_id: AggregateId) -> Result<AccountStatement, AppError> {
        Ok(self.reporter.account_details_for(account_id)?)
    }
}

fn scenario(account_id: AggregateId, number: &str) -> Vec<AccountCommand> {
    vec![
        OpenAccount {
            account_id,
            number: number.to_string(),
        }
        .into(),
        DepositMoney {
            account_id,
            amount: 1000,
        }
        .into(),
        WithdrawMoney {
            account_id,
            amount: 100,
        }
        .into(),
        DepositMoney {
            account_id,
            amount: 500,
        }
        .into(),
    ]
}

/// Renders `statement` in the requested format.
///
/// # Errors
///
/// Returns `AppError::Serialization` if JSON rendering fails.
pub fn render(statement: &AccountStatement, format: StatementFormat) -> Result<String, AppError> {
    match format {
        StatementFormat::Text => Ok(statement.to_string()),
        StatementFormat::Json => Ok(serde_json::to_string_pretty(statement)? + "\n"),
    }
}

/// Opens an account, moves money in and out, and returns the rendered
/// statement.
///
/// # Errors
///
/// Returns the first error raised while building the runtime, dispatching a
/// command or rendering the statement.
pub fn run(config: &Config) -> Result<String, AppError> {
    let mut bank = Bank::new()?;
    let account_id = AggregateId::new();

    for command in scenario(account_id, &config.account_number) {
        bank.execute(&command)?;
    }

    render(&bank.statement(account_id)?, config.statement_format)
}

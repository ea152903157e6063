//! The account aggregate: state, business rules and registry wiring.

use std::sync::Arc;

use chronicle_core::aggregate::EventSourced;
use chronicle_core::command::Command;
use chronicle_core::error::DomainError;
use chronicle_core::factory::AggregateFactory;
use chronicle_core::identifier::AggregateId;
use chronicle_core::registry::{CommandHandlers, EventAppliers};
use thiserror::Error;

use super::commands::{ACCOUNT_AGGREGATE_TYPE, AccountCommand};
use super::events::{
    ACCOUNT_OPENED, AccountEvent, AccountOpened, MONEY_DEPOSITED, MONEY_WITHDRAWN,
    MoneyDeposited, MoneyWithdrawn,
};

/// Business rule violations of the account aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// `OpenAccount` on an account that is already open.
    #[error("account is already opened")]
    AlreadyOpened,
    /// A money movement on an account that was never opened.
    #[error("account is not opened")]
    NotOpened,
    /// A deposit or withdrawal of zero or less.
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(i64),
    /// A withdrawal larger than the balance.
    #[error("balance is not high enough: balance {balance}, requested {requested}")]
    BalanceIsNotHighEnough {
        /// Balance at the time of the request.
        balance: i64,
        /// Requested withdrawal.
        requested: i64,
    },
}

impl From<AccountError> for DomainError {
    fn from(err: AccountError) -> Self {
        DomainError::Validation(err.to_string())
    }
}

/// Domain state of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    /// Account number, set once the account is opened.
    pub number: Option<String>,
    /// Current balance.
    pub balance: i64,
}

impl Account {
    /// Returns `true` once `AccountOpened` has been applied.
    #[must_use]
    pub fn is_opened(&self) -> bool {
        self.number.is_some()
    }

    fn ensure_opened(&self) -> Result<(), AccountError> {
        if self.is_opened() {
            Ok(())
        } else {
            Err(AccountError::NotOpened)
        }
    }
}

/// The event-sourced account aggregate.
pub type AccountAggregate = EventSourced<Account, AccountCommand, AccountEvent>;

fn ensure_positive(amount: i64) -> Result<(), AccountError> {
    if amount > 0 {
        Ok(())
    } else {
        Err(AccountError::NonPositiveAmount(amount))
    }
}

fn misrouted(command: &AccountCommand) -> DomainError {
    DomainError::CommandHandlerNotFound {
        command_type: command.command_type().to_owned(),
    }
}

fn open_account(
    account: &Account,
    command: &AccountCommand,
) -> Result<Vec<AccountEvent>, DomainError> {
    let AccountCommand::OpenAccount(open) = command else {
        return Err(misrouted(command));
    };
    if account.is_opened() {
        return Err(AccountError::AlreadyOpened.into());
    }
    Ok(vec![AccountEvent::AccountOpened(AccountOpened {
        account_id: open.account_id,
        number: open.number.clone(),
    })])
}

fn deposit_money(
    account: &Account,
    command: &AccountCommand,
) -> Result<Vec<AccountEvent>, DomainError> {
    let AccountCommand::DepositMoney(deposit) = command else {
        return Err(misrouted(command));
    };
    account.ensure_opened()?;
    ensure_positive(deposit.amount)?;
    Ok(vec![AccountEvent::MoneyDeposited(MoneyDeposited {
        account_id: deposit.account_id,
        amount: deposit.amount,
        balance: account.balance + deposit.amount,
    })])
}

fn withdraw_money(
    account: &Account,
    command: &AccountCommand,
) -> Result<Vec<AccountEvent>, DomainError> {
    let AccountCommand::WithdrawMoney(withdraw) = command else {
        return Err(misrouted(command));
    };
    account.ensure_opened()?;
    ensure_positive(withdraw.amount)?;
    if withdraw.amount > account.balance {
        return Err(AccountError::BalanceIsNotHighEnough {
            balance: account.balance,
            requested: withdraw.amount,
        }
        .into());
    }
    Ok(vec![AccountEvent::MoneyWithdrawn(MoneyWithdrawn {
        account_id: withdraw.account_id,
        amount: withdraw.amount,
        balance: account.balance - withdraw.amount,
    })])
}

/// Command handlers of the account aggregate.
#[must_use]
pub fn account_command_handlers() -> CommandHandlers<Account, AccountCommand, AccountEvent> {
    let mut handlers = CommandHandlers::new();
    handlers
        .register("OpenAccount", open_account)
        .register("DepositMoney", deposit_money)
        .register("WithdrawMoney", withdraw_money);
    handlers
}

/// Event appliers of the account aggregate.
///
/// Deposits and withdrawals carry the resulting balance, so replay takes it
/// from the event rather than recomputing it.
#[must_use]
pub fn account_event_appliers() -> EventAppliers<Account, AccountEvent> {
    let mut appliers = EventAppliers::new();
    appliers
        .register(ACCOUNT_OPENED, |account: &mut Account, event: &AccountEvent| {
            if let AccountEvent::AccountOpened(opened) = event {
                account.number = Some(opened.number.clone());
            }
        })
        .register(MONEY_DEPOSITED, |account: &mut Account, event: &AccountEvent| {
            if let AccountEvent::MoneyDeposited(deposited) = event {
                account.balance = deposited.balance;
            }
        })
        .register(MONEY_WITHDRAWN, |account: &mut Account, event: &AccountEvent| {
            if let AccountEvent::MoneyWithdrawn(withdrawn) = event {
                account.balance = withdrawn.balance;
            }
        });
    appliers
}

/// Builds a fresh, unopened account aggregate.
#[must_use]
pub fn new_account(account_id: AggregateId) -> AccountAggregate {
    EventSourced::new(
        account_id,
        ACCOUNT_AGGREGATE_TYPE,
        Account::default(),
        Arc::new(account_command_handlers()),
        Arc::new(account_event_appliers()),
    )
}

/// Registers the account aggregate with `factory`. The registries are built
/// once and shared by every account the factory creates.
pub fn register_account(factory: &mut AggregateFactory<AccountCommand, AccountEvent>) {
    let handlers = Arc::new(account_command_handlers());
    let appliers = Arc::new(account_event_appliers());
    factory.register(ACCOUNT_AGGREGATE_TYPE, move |account_id| {
        Box::new(EventSourced::new(
            account_id,
            ACCOUNT_AGGREGATE_TYPE,
            Account::default(),
            Arc::clone(&handlers),
            Arc::clone(&appliers),
        ))
    });
}

//! Projects account events onto account statements.

use std::sync::Arc;

use chronicle_core::error::DomainError;
use chronicle_core::handler::RoutedEventHandler;
use chronicle_core::identifier::AggregateId;
use tracing::debug;

use super::reporting::{AccountReporting, AccountStatement, Ledger, LedgerAction};
use crate::domain::events::{ACCOUNT_OPENED, AccountEvent, MONEY_DEPOSITED, MONEY_WITHDRAWN};

/// Name the projector reports in `DomainError::EventHandler`.
pub const ACCOUNT_STATEMENT_PROJECTOR: &str = "account-statement-projector";

fn add_ledger(
    reporter: &dyn AccountReporting,
    account_id: AggregateId,
    ledger: Ledger,
) -> Result<(), DomainError> {
    let mut statement = reporter.account_details_for(account_id)?;
    statement.record(ledger);
    debug!(%account_id, balance = statement.balance, "statement updated");
    reporter.save(statement)
}

/// Builds the event handler keeping `reporter` in step with account events.
///
/// A deposit or withdrawal for an account with no statement fails with the
/// reporter's `DomainError::AggregateNotFound`.
#[must_use]
pub fn account_statement_projector(
    reporter: Arc<dyn AccountReporting>,
) -> RoutedEventHandler<AccountEvent> {
    let mut projector = RoutedEventHandler::new(ACCOUNT_STATEMENT_PROJECTOR);

    let on_opened = Arc::clone(&reporter);
    let on_deposited = Arc::clone(&reporter);
    let on_withdrawn = reporter;

    projector
        .on(ACCOUNT_OPENED, move |event| match event {
            AccountEvent::AccountOpened(opened) => {
                debug!(account_id = %opened.account_id, "statement opened");
                on_opened.save(AccountStatement::opened(
                    opened.account_id,
                    opened.number.clone(),
                ))
            }
            _ => Ok(()),
        })
        .on(MONEY_DEPOSITED, move |event| match event {
            AccountEvent::MoneyDeposited(deposited) => add_ledger(
                on_deposited.as_ref(),
                deposited.account_id,
                Ledger {
                    action: LedgerAction::Deposit,
                    amount: deposited.amount,
                    balance: deposited.balance,
                },
            ),
            _ => Ok(()),
        })
        .on(MONEY_WITHDRAWN, move |event| match event {
            AccountEvent::MoneyWithdrawn(withdrawn) => add_ledger(
                on_withdrawn.as_ref(),
                withdrawn.account_id,
                Ledger {
                    action: LedgerAction::Withdrawal,
                    amount: withdrawn.amount,
                    balance: withdrawn.balance,
                },
            ),
            _ => Ok(()),
        });

    projector
}

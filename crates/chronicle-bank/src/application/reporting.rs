//! Account statement read model and its in-memory store.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use chronicle_core::error::DomainError;
use chronicle_core::identifier::AggregateId;
use serde::{Deserialize, Serialize};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerAction {
    /// Money came in.
    Deposit,
    /// Money went out.
    Withdrawal,
}

/// One money movement on a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Deposit or withdrawal.
    pub action: LedgerAction,
    /// Amount moved, always positive.
    pub amount: i64,
    /// Balance after the movement.
    pub balance: i64,
}

impl Ledger {
    /// Amount with its sign: negative for withdrawals.
    #[must_use]
    pub fn signed_amount(&self) -> i64 {
        match self.action {
            LedgerAction::Deposit => self.amount,
            LedgerAction::Withdrawal => -self.amount,
        }
    }
}

/// Read model of one account: number, balance and every movement so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatement {
    /// The account this statement describes.
    pub account_id: AggregateId,
    /// The account number.
    pub number: String,
    /// Balance after the last movement.
    pub balance: i64,
    /// Movements in the order they happened.
    pub ledgers: Vec<Ledger>,
}

impl AccountStatement {
    /// Creates an empty statement for a newly opened account.
    #[must_use]
    pub fn opened(account_id: AggregateId, number: impl Into<String>) -> Self {
        Self {
            account_id,
            number: number.into(),
            balance: 0,
            ledgers: Vec::new(),
        }
    }

    /// Records a movement and moves the balance to the one it carries.
    pub fn record(&mut self, ledger: Ledger) {
        self.balance = ledger.balance;
        self.ledgers.push(ledger);
    }
}

fn money(amount: i64) -> String {
    format!("{amount}.00")
}

/// Renders the statement as a console table:
///
/// ```text
/// Account #ACC777:
/// # |   Amount |  Balance
/// 1 |  1000.00 |  1000.00
/// 2 |  -100.00 |   900.00
/// ```
impl fmt::Display for AccountStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Account #{}:", self.number)?;
        writeln!(f, "# | {:>8} | {:>8}", "Amount", "Balance")?;
        for (index, ledger) in self.ledgers.iter().enumerate() {
            writeln!(
                f,
                "{} | {:>8} | {:>8}",
                index + 1,
                money(ledger.signed_amount()),
                money(ledger.balance)
            )?;
        }
        Ok(())
    }
}

/// Read and write access to account statements.
pub trait AccountReporting: Send + Sync {
    /// Returns the statement of `account_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if no statement exists, or
    /// `DomainError::Infrastructure` if the backing store fails.
    fn account_details_for(&self, account_id: AggregateId) -> Result<AccountStatement, DomainError>;

    /// Inserts or replaces a statement.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the backing store fails.
    fn save(&self, statement: AccountStatement) -> Result<(), DomainError>;
}

/// Statement store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAccountReporter {
    statements: RwLock<HashMap<AggregateId, AccountStatement>>,
}

impl InMemoryAccountReporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountReporting for InMemoryAccountReporter {
    fn account_details_for(&self, account_id: AggregateId) -> Result<AccountStatement, DomainError> {
        let statements = self
            .statements
            .read()
            .map_err(|_| DomainError::Infrastructure("statement store lock poisoned".into()))?;
        statements
            .get(&account_id)
            .cloned()
            .ok_or(DomainError::AggregateNotFound(account_id))
    }

    fn save(&self, statement: AccountStatement) -> Result<(), DomainError> {
        let mut statements = self
            .statements
            .write()
            .map_err(|_| DomainError::Infrastructure("statement store lock poisoned".into()))?;
        statements.insert(statement.account_id, statement);
        Ok(())
    }
}

//! Domain events for the bank account context.

use chronicle_core::event::DomainEvent;
use chronicle_core::identifier::AggregateId;
use serde::{Deserialize, Serialize};

/// Event type tag of [`AccountOpened`].
pub const ACCOUNT_OPENED: &str = "AccountOpened";
/// Event type tag of [`MoneyDeposited`].
pub const MONEY_DEPOSITED: &str = "MoneyDeposited";
/// Event type tag of [`MoneyWithdrawn`].
pub const MONEY_WITHDRAWN: &str = "MoneyWithdrawn";

/// Emitted when an account is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOpened {
    /// The opened account.
    pub account_id: AggregateId,
    /// The human-facing account number.
    pub number: String,
}

/// Emitted when money is deposited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyDeposited {
    /// The credited account.
    pub account_id: AggregateId,
    /// The deposited amount.
    pub amount: i64,
    /// The balance after the deposit.
    pub balance: i64,
}

/// Emitted when money is withdrawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyWithdrawn {
    /// The debited account.
    pub account_id: AggregateId,
    /// The withdrawn amount.
    pub amount: i64,
    /// The balance after the withdrawal.
    pub balance: i64,
}

/// Event variants of the account aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum AccountEvent {
    /// An account was opened.
    AccountOpened(AccountOpened),
    /// Money was deposited.
    MoneyDeposited(MoneyDeposited),
    /// Money was withdrawn.
    MoneyWithdrawn(MoneyWithdrawn),
}

impl AccountEvent {
    /// The account this event belongs to.
    #[must_use]
    pub fn account_id(&self) -> AggregateId {
        match self {
            Self::AccountOpened(event) => event.account_id,
            Self::MoneyDeposited(event) => event.account_id,
            Self::MoneyWithdrawn(event) => event.account_id,
        }
    }
}

impl DomainEvent for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::AccountOpened(_) => ACCOUNT_OPENED,
            Self::MoneyDeposited(_) => MONEY_DEPOSITED,
            Self::MoneyWithdrawn(_) => MONEY_WITHDRAWN,
        }
    }
}

//! Commands for the bank account context.

use chronicle_core::command::Command;
use chronicle_core::identifier::AggregateId;
use serde::{Deserialize, Serialize};

/// Aggregate type tag of the account aggregate.
pub const ACCOUNT_AGGREGATE_TYPE: &str = "account.Aggregate";

/// Command to open a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAccount {
    /// The account to open.
    pub account_id: AggregateId,
    /// The human-facing account number.
    pub number: String,
}

/// Command to deposit money into an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositMoney {
    /// The account receiving the deposit.
    pub account_id: AggregateId,
    /// Amount in whole currency units; must be positive.
    pub amount: i64,
}

/// Command to withdraw money from an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawMoney {
    /// The account being debited.
    pub account_id: AggregateId,
    /// Amount in whole currency units; must be positive.
    pub amount: i64,
}

/// Command variants accepted by the account aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCommand {
    /// Open an account.
    OpenAccount(OpenAccount),
    /// Deposit money.
    DepositMoney(DepositMoney),
    /// Withdraw money.
    WithdrawMoney(WithdrawMoney),
}

impl Command for AccountCommand {
    fn aggregate_id(&self) -> AggregateId {
        match self {
            Self::OpenAccount(command) => command.account_id,
            Self::DepositMoney(command) => command.account_id,
            Self::WithdrawMoney(command) => command.account_id,
        }
    }

    fn aggregate_type(&self) -> &'static str {
        ACCOUNT_AGGREGATE_TYPE
    }

    fn command_type(&self) -> &'static str {
        match self {
            Self::OpenAccount(_) => "OpenAccount",
            Self::DepositMoney(_) => "DepositMoney",
            Self::WithdrawMoney(_) => "WithdrawMoney",
        }
    }
}

impl From<OpenAccount> for AccountCommand {
    fn from(command: OpenAccount) -> Self {
        Self::OpenAccount(command)
    }
}

impl From<DepositMoney> for AccountCommand {
    fn from(command: DepositMoney) -> Self {
        Self::DepositMoney(command)
    }
}

impl From<WithdrawMoney> for AccountCommand {
    fn from(command: WithdrawMoney) -> Self {
        Self::WithdrawMoney(command)
    }
}

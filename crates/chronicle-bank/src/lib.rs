//! Chronicle demo domain: bank accounts.
//!
//! An `Account` aggregate accepts `OpenAccount`, `DepositMoney` and
//! `WithdrawMoney` commands. A statement projector keeps a per-account read
//! model of ledgers and the running balance.

pub mod application;
pub mod domain;

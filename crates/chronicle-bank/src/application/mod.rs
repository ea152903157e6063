//! Application layer for bank accounts: the statement read model and its
//! projector.

pub mod projector;
pub mod reporting;

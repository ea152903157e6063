//! Domain layer for bank accounts.

pub mod aggregates;
pub mod commands;
pub mod events;

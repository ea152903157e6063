//! Chronicle Core: event-sourced aggregate runtime.
//!
//! This crate defines the machinery that rebuilds an aggregate from its
//! ordered event history, turns commands into new events, persists those
//! events under optimistic concurrency and fans them out to subscribers.
//! It contains no concrete storage backend; see `chronicle-event-store` for
//! the in-memory reference implementation.

pub mod aggregate;
pub mod bus;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod factory;
pub mod handler;
pub mod identifier;
pub mod identity_map;
pub mod middleware;
pub mod registry;
pub mod repository;
pub mod store;
pub mod unit_of_work;

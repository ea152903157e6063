//! Event store backends for Chronicle.

pub mod in_memory_event_store;

pub use in_memory_event_store::InMemoryEventStore;

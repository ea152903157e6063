//! Domain error types.

use thiserror::Error;

use crate::identifier::AggregateId;

/// Top-level domain error type.
///
/// Every component returns these to its immediate caller; none of them is
/// retried inside the runtime.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No command handler is registered for the command type.
    #[error("command handler not found: {command_type}")]
    CommandHandlerNotFound {
        /// The unmatched command type tag.
        command_type: String,
    },

    /// No event applier is registered for the event type.
    #[error("event applier not found: {event_type}")]
    EventApplierNotFound {
        /// The unmatched event type tag.
        event_type: String,
    },

    /// The aggregate factory has no constructor for the aggregate type.
    #[error("aggregate is not registered: {0}")]
    AggregateNotRegistered(String),

    /// A read model or report has no entry for the aggregate.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(AggregateId),

    /// An aggregate was requested as a different type than the one tracked
    /// under its id.
    #[error("aggregate {aggregate_id} is a {actual}, not a {requested}")]
    AggregateTypeMismatch {
        /// The requested aggregate.
        aggregate_id: AggregateId,
        /// The type tag the caller asked for.
        requested: String,
        /// The type tag of the tracked instance.
        actual: String,
    },

    /// Optimistic concurrency conflict.
    #[error(
        "concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: AggregateId,
        /// The version the writer observed when it loaded the aggregate.
        expected: u64,
        /// The durable stream length at the time of the append.
        actual: u64,
    },

    /// A business rule rejected the command.
    #[error("validation error: {0}")]
    Validation(String),

    /// A subscriber failed while handling a published event.
    #[error("event handler {handler} failed: {reason}")]
    EventHandler {
        /// Name of the failing handler.
        handler: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// A builder was finalised without a required collaborator.
    #[error("missing dependency: {0}")]
    MissingDependency(&'static str),

    /// A unit of work stored some aggregates before a later store failed.
    ///
    /// The writes listed in `committed` are durable and were not undone.
    #[error(
        "unit of work partially committed {count} aggregate(s): {source}",
        count = .committed.len()
    )]
    PartialCommit {
        /// Aggregates whose events were durably appended.
        committed: Vec<AggregateId>,
        /// The error that stopped the commit.
        source: Box<DomainError>,
    },
}

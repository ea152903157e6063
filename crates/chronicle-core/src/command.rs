//! Command abstractions.

use crate::identifier::AggregateId;

/// Trait that all commands implement.
///
/// A command is an immutable request to change one aggregate; it may be
/// rejected.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The aggregate this command targets.
    fn aggregate_id(&self) -> AggregateId;

    /// The aggregate type tag used to pick a constructor from the factory.
    fn aggregate_type(&self) -> &'static str;

    /// The command type tag used to route to a command handler.
    fn command_type(&self) -> &'static str;
}

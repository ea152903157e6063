//! Command handler chain.
//!
//! A [`CommandHandler`] takes a command and returns the events it produced.
//! [`Middleware`] wraps a handler in another one; [`with_middleware`] builds
//! the chain so the first middleware listed runs outermost.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{info, info_span, warn};

use crate::command::Command;
use crate::dispatcher::Dispatcher;
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::unit_of_work::UnitOfWork;

/// Anything that executes commands.
pub trait CommandHandler<C, E> {
    /// Executes `command` and returns the events it produced.
    ///
    /// # Errors
    ///
    /// Returns the error of whatever step rejected or failed the command.
    fn handle(&mut self, command: &C) -> Result<Vec<E>, DomainError>;
}

/// A boxed handler, the unit middleware composes.
pub type BoxedCommandHandler<C, E> = Box<dyn CommandHandler<C, E>>;

/// Adapts a closure into a [`CommandHandler`].
pub struct CommandHandlerFn<F>(pub F);

impl<C, E, F> CommandHandler<C, E> for CommandHandlerFn<F>
where
    F: FnMut(&C) -> Result<Vec<E>, DomainError>,
{
    fn handle(&mut self, command: &C) -> Result<Vec<E>, DomainError> {
        (self.0)(command)
    }
}

impl<F> fmt::Debug for CommandHandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandlerFn").finish_non_exhaustive()
    }
}

impl<C, E> CommandHandler<C, E> for Dispatcher<C, E>
where
    C: Command,
    E: DomainEvent,
{
    fn handle(&mut self, command: &C) -> Result<Vec<E>, DomainError> {
        Dispatcher::handle(self, command)
    }
}

/// A unit of work shared between the handler that fills it and the
/// transactional middleware that commits it.
impl<C, E> CommandHandler<C, E> for Arc<Mutex<UnitOfWork<C, E>>>
where
    C: Command,
    E: DomainEvent,
{
    fn handle(&mut self, command: &C) -> Result<Vec<E>, DomainError> {
        let mut unit_of_work = self.lock().map_err(|_| poisoned())?;
        unit_of_work.handle(command)
    }
}

/// Wraps a handler in another handler.
pub trait Middleware<C, E> {
    /// Returns a handler that runs around `next`.
    fn wrap(&self, next: BoxedCommandHandler<C, E>) -> BoxedCommandHandler<C, E>;
}

/// Wraps `handler` in `middleware`, applied in reverse so `middleware[0]`
/// sees each command first.
#[must_use]
pub fn with_middleware<C, E>(
    handler: BoxedCommandHandler<C, E>,
    middleware: &[&dyn Middleware<C, E>],
) -> BoxedCommandHandler<C, E> {
    middleware
        .iter()
        .rev()
        .fold(handler, |next, layer| layer.wrap(next))
}

fn poisoned() -> DomainError {
    DomainError::Infrastructure("unit of work lock poisoned".into())
}

/// Commits a shared unit of work after every successful command.
///
/// A failed command commits nothing. A failed commit rolls the session back
/// and returns the commit error.
pub struct TransactionalMiddleware<C, E> {
    unit_of_work: Arc<Mutex<UnitOfWork<C, E>>>,
}

impl<C, E> TransactionalMiddleware<C, E> {
    /// Creates the middleware over `unit_of_work`.
    #[must_use]
    pub fn new(unit_of_work: Arc<Mutex<UnitOfWork<C, E>>>) -> Self {
        Self { unit_of_work }
    }
}

impl<C, E> Middleware<C, E> for TransactionalMiddleware<C, E>
where
    C: Command + 'static,
    E: DomainEvent,
{
    fn wrap(&self, next: BoxedCommandHandler<C, E>) -> BoxedCommandHandler<C, E> {
        Box::new(Transactional {
            next,
            unit_of_work: Arc::clone(&self.unit_of_work),
        })
    }
}

impl<C, E> fmt::Debug for TransactionalMiddleware<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionalMiddleware").finish_non_exhaustive()
    }
}

struct Transactional<C, E> {
    next: BoxedCommandHandler<C, E>,
    unit_of_work: Arc<Mutex<UnitOfWork<C, E>>>,
}

impl<C, E> CommandHandler<C, E> for Transactional<C, E>
where
    C: Command,
    E: DomainEvent,
{
    fn handle(&mut self, command: &C) -> Result<Vec<E>, DomainError> {
        let events = self.next.handle(command)?;

        let mut unit_of_work = self.unit_of_work.lock().map_err(|_| poisoned())?;
        if let Err(err) = unit_of_work.commit() {
            warn!(error = %err, "commit failed; rolling back unit of work");
            unit_of_work.rollback();
            return Err(err);
        }
        Ok(events)
    }
}

/// Logs every command inside a span carrying its type and target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl<C, E> Middleware<C, E> for LoggingMiddleware
where
    C: Command + 'static,
    E: DomainEvent,
{
    fn wrap(&self, next: BoxedCommandHandler<C, E>) -> BoxedCommandHandler<C, E> {
        Box::new(Logged { next })
    }
}

struct Logged<C, E> {
    next: BoxedCommandHandler<C, E>,
}

impl<C, E> CommandHandler<C, E> for Logged<C, E>
where
    C: Command,
    E: DomainEvent,
{
    fn handle(&mut self, command: &C) -> Result<Vec<E>, DomainError> {
        let span = info_span!(
            "command",
            command_type = command.command_type(),
            aggregate_id = %command.aggregate_id(),
        );
        let _entered = span.enter();

        match self.next.handle(command) {
            Ok(events) => {
                info!(events = events.len(), "command handled");
                Ok(events)
            }
            Err(err) => {
                warn!(error = %err, "command failed");
                Err(err)
            }
        }
    }
}

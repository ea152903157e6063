//! Test event stores: mock `EventStore` implementations for tests.

use std::sync::Mutex;

use chronicle_core::error::DomainError;
use chronicle_core::event::DomainEvent;
use chronicle_core::identifier::AggregateId;
use chronicle_core::store::EventStore;

/// Events recorded by one `append` call: aggregate, expected version, events.
pub type AppendCall<E> = (AggregateId, u64, Vec<E>);

/// An event store that returns a fixed history from every `load_stream` call
/// and records every `append` call without checking versions.
///
/// Built with [`RecordingEventStore::failing_for`], appends to one chosen
/// aggregate fail instead of being recorded. Built with
/// [`RecordingEventStore::failing_once_for`], only the first such append fails.
#[derive(Debug)]
pub struct RecordingEventStore<E> {
    history: Vec<E>,
    failing_for: Option<AggregateId>,
    /// Failures left for `failing_for`; `None` means every append fails.
    failures_left: Mutex<Option<u32>>,
    appended: Mutex<Vec<AppendCall<E>>>,
}

impl<E: DomainEvent> RecordingEventStore<E> {
    /// Create a recording store that returns `history` for every aggregate.
    #[must_use]
    pub fn new(history: Vec<E>) -> Self {
        Self {
            history,
            failing_for: None,
            failures_left: Mutex::new(None),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Create a recording store with no history whose appends to
    /// `aggregate_id` fail with an infrastructure error.
    #[must_use]
    pub fn failing_for(aggregate_id: AggregateId) -> Self {
        Self {
            history: Vec::new(),
            failing_for: Some(aggregate_id),
            failures_left: Mutex::new(None),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Create a recording store with no history whose first append to
    /// `aggregate_id` fails with an infrastructure error; later appends to it
    /// are recorded.
    #[must_use]
    pub fn failing_once_for(aggregate_id: AggregateId) -> Self {
        Self {
            history: Vec::new(),
            failing_for: Some(aggregate_id),
            failures_left: Mutex::new(Some(1)),
            appended: Mutex::new(Vec::new()),
        }
    }

    fn should_fail(&self, aggregate_id: AggregateId) -> bool {
        if self.failing_for != Some(aggregate_id) {
            return false;
        }
        let mut failures_left = self.failures_left.lock().unwrap();
        match *failures_left {
            None => true,
            Some(0) => false,
            Some(left) => {
                *failures_left = Some(left - 1);
                true
            }
        }
    }

    /// Returns a snapshot of all recorded `append` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended(&self) -> Vec<AppendCall<E>> {
        self.appended.lock().unwrap().clone()
    }

    /// Returns every appended event, flattened in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<E> {
        self.appended
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, _, events)| events.iter().cloned())
            .collect()
    }
}

impl<E: DomainEvent> EventStore<E> for RecordingEventStore<E> {
    fn load_stream(&self, _aggregate_id: AggregateId) -> Result<Vec<E>, DomainError> {
        Ok(self.history.clone())
    }

    fn append(
        &self,
        aggregate_id: AggregateId,
        expected_version: u64,
        events: &[E],
    ) -> Result<(), DomainError> {
        if self.should_fail(aggregate_id) {
            return Err(DomainError::Infrastructure("connection refused".into()));
        }
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

impl<E: DomainEvent> EventStore<E> for FailingEventStore {
    fn load_stream(&self, _aggregate_id: AggregateId) -> Result<Vec<E>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    fn append(
        &self,
        _aggregate_id: AggregateId,
        _expected_version: u64,
        _events: &[E],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

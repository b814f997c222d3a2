//! Record store backends.

use std::time::{Duration, Instant};

use log::debug;

use crate::{Error, Predicate, Record};

/// A document collection that can be searched with field-equality
/// predicates.
///
/// Implementations receive predicates that have already been validated and
/// must return matching records in the collection's natural order.
pub trait RecordStore {
    /// Find all records matching the given predicate, giving up with
    /// [`Error::BackendUnavailable`] if the search takes longer than
    /// `timeout`.
    fn find(&self, predicate: &Predicate, timeout: Duration) -> Result<Vec<Record>, Error>;

    /// Append the given records to the collection, returning how many were
    /// stored.
    fn insert(&mut self, records: Vec<Record>) -> Result<usize, Error>;
}

/// The instant a query started now with the given timeout must finish by.
/// Timeouts too large to represent never expire.
pub(crate) fn deadline(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

pub(crate) fn expired(deadline: Option<Instant>) -> bool {
    deadline.map_or(false, |d| Instant::now() >= d)
}

/// A store that keeps its records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<Record>,
}

impl MemoryStore {
    /// Constructor.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn find(&self, predicate: &Predicate, timeout: Duration) -> Result<Vec<Record>, Error> {
        let deadline = deadline(timeout);
        let mut found = Vec::new();
        for record in &self.records {
            if expired(deadline) {
                return Err(Error::BackendUnavailable("query timed out".to_string()));
            }
            if predicate.matches(record) {
                found.push(record.clone());
            }
        }
        debug!(
            "Memory store matched {} of {} records for {}",
            found.len(),
            self.records.len(),
            predicate
        );
        Ok(found)
    }

    fn insert(&mut self, records: Vec<Record>) -> Result<usize, Error> {
        let count = records.len();
        self.records.extend(records);
        Ok(count)
    }
}

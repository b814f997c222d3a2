//! The record store client shared by every dashboard session.

use std::time::Duration;

use log::{debug, error};

use crate::{Error, Predicate, Record, RecordStore};

/// Internal document identifier assigned by the store. It is never shown to
/// the rendering layer.
pub const ID_FIELD: &str = "_id";

/// Process-scoped access to the animal record store.
///
/// Constructed once at startup and handed to each [`crate::Session`] by
/// reference.
#[derive(Debug)]
pub struct Shelter<S> {
    store: S,
    timeout: Duration,
}

impl<S: RecordStore> Shelter<S> {
    /// Constructor.
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// The bounded wait applied to every query.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Execute the given predicate against the store.
    ///
    /// The predicate is validated before the store is touched. Failures are
    /// reported as [`Error::InvalidQuery`] or [`Error::BackendUnavailable`].
    pub fn query(&self, predicate: &Predicate) -> Result<Vec<Record>, Error> {
        predicate.validate()?;
        debug!("Querying records with {}", predicate);
        let mut records = self.store.find(predicate, self.timeout)?;
        for record in records.iter_mut() {
            record.remove(ID_FIELD);
        }
        debug!("Query {} returned {} records", predicate, records.len());
        Ok(records)
    }

    /// Like [`Shelter::query`], but degrades to an empty result when the query
    /// is invalid or the store cannot answer it. Such failures are logged.
    pub fn read(&self, predicate: &Predicate) -> Vec<Record> {
        degrade(self.query(predicate))
    }

    /// Fetch every record of the given rescue type.
    pub fn filter_by_rescue_type(&self, rescue_type: &str) -> Vec<Record> {
        self.read(&Predicate::all().with(crate::query::RESCUE_TYPE_FIELD, rescue_type))
    }

    /// Add records to the store. Returns the number of records stored.
    pub fn insert(&mut self, records: Vec<Record>) -> Result<usize, Error> {
        self.store.insert(records)
    }
}

/// Recover from store failures by yielding no records. Errors that a store
/// query can't legitimately produce are logged the same way, since nothing
/// downstream of the store can act on them either.
pub(crate) fn degrade(result: Result<Vec<Record>, Error>) -> Vec<Record> {
    match result {
        Ok(records) => records,
        Err(e) => {
            if e.is_recoverable() {
                error!("Record store query failed, showing no records: {}", e);
            } else {
                error!("Unexpected error while querying records: {}", e);
            }
            Vec::new()
        }
    }
}

//! In-memory research history
//!
//! Append-only list of finished runs, shared by every request handler.
//! Records live only as long as the process.

use crate::orchestrator::types::ResearchRecord;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// History store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// A writer panicked while holding the lock
    #[error("research history is unavailable: lock poisoned")]
    Poisoned,
}

/// Shared, append-only list of research records
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    pub(crate) records: Arc<RwLock<Vec<ResearchRecord>>>,
}

impl HistoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, returning the new total
    pub fn append(&self, record: ResearchRecord) -> Result<usize, HistoryError> {
        let mut records = self.records.write().map_err(|_| HistoryError::Poisoned)?;
        records.push(record);
        Ok(records.len())
    }

    /// Snapshot of all records in append order
    pub fn list(&self) -> Result<Vec<ResearchRecord>, HistoryError> {
        let records = self.records.read().map_err(|_| HistoryError::Poisoned)?;
        Ok(records.clone())
    }

    /// Number of records
    pub fn len(&self) -> Result<usize, HistoryError> {
        let records = self.records.read().map_err(|_| HistoryError::Poisoned)?;
        Ok(records.len())
    }

    /// True when no records are stored
    pub fn is_empty(&self) -> Result<bool, HistoryError> {
        self.len().map(|len| len == 0)
    }

    /// Remove all records, returning how many were removed
    pub fn clear(&self) -> Result<usize, HistoryError> {
        let mut records = self.records.write().map_err(|_| HistoryError::Poisoned)?;
        let removed = records.len();
        records.clear();
        Ok(removed)
    }
}

//! Sanction store
//!
//! Centralized map of sanction records, shared between the dispatcher and
//! the scheduled lift tasks.

use crate::error::{WardenError, WardenResult};
use crate::sanction::SanctionRecord;
use dashmap::DashMap;
use std::sync::Arc;

/// Store for sanction records
#[derive(Debug, Clone, Default)]
pub struct SanctionStore {
    records: Arc<DashMap<String, SanctionRecord>>,
}

impl SanctionStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record
    pub fn add(&self, record: SanctionRecord) {
        self.records.insert(record.id.clone(), record);
    }

    /// Get a record by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SanctionRecord> {
        self.records.get(id).map(|entry| entry.clone())
    }

    /// Mark a record as lifted and evict it. Only applied sanctions occupy
    /// the map, so it stays bounded by the number of concurrently active
    /// timeouts.
    ///
    /// # Errors
    /// Returns an error if the record does not exist or refuses the state
    /// transition (it is reinserted in that case)
    pub fn mark_lifted(&self, id: &str) -> WardenResult<SanctionRecord> {
        let Some((_, mut record)) = self.records.remove(id) else {
            return Err(WardenError::SanctionNotFound(id.to_string()));
        };
        if let Err(e) = record.lift() {
            self.records.insert(record.id.clone(), record);
            return Err(e);
        }
        Ok(record)
    }
}

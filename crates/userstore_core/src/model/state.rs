//! Immutable store snapshot.
//!
//! # Responsibility
//! - Hold the ordered record list and the tag (`cats`) list.
//! - Share unchanged sub-structures between consecutive snapshots.
//!
//! # Invariants
//! - Both lists sit behind `Arc`; a snapshot that does not touch a list
//!   reuses the previous `Arc`, so `Arc::ptr_eq` detects "unchanged".
//! - Record order is insertion order.

use crate::model::record::{Record, RecordId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tags seeded into every fresh store.
pub const DEFAULT_CATS: &[&str] = &["rojizo"];

/// Full store state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(rename = "usuarios")]
    records: Arc<Vec<Record>>,
    cats: Arc<Vec<String>>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new(
            Vec::new(),
            DEFAULT_CATS.iter().map(|cat| (*cat).to_string()).collect(),
        )
    }
}

impl StoreState {
    pub fn new(records: Vec<Record>, cats: Vec<String>) -> Self {
        Self {
            records: Arc::new(records),
            cats: Arc::new(cats),
        }
    }

    /// Ordered records, oldest first.
    pub fn records(&self) -> &Arc<Vec<Record>> {
        &self.records
    }

    pub fn cats(&self) -> &Arc<Vec<String>> {
        &self.cats
    }

    /// Returns the first record with `id`.
    pub fn find(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }

    /// Largest id currently held, if any.
    pub fn max_id(&self) -> Option<RecordId> {
        self.records.iter().map(|record| record.id).max()
    }

    /// Builds the next snapshot with new records and the same tag list.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            records: Arc::new(records),
            cats: Arc::clone(&self.cats),
        }
    }

    /// Builds the next snapshot with new tags and the same record list.
    pub fn with_cats(&self, cats: Vec<String>) -> Self {
        Self {
            records: Arc::clone(&self.records),
            cats: Arc::new(cats),
        }
    }
}

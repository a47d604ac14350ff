//! Pure immutable-update functions over `StoreState`.
//!
//! Each function takes the current snapshot and describes the next one
//! without touching the input. Sub-structures that do not change are shared
//! with the input snapshot.

use crate::model::record::{Record, RecordId, RecordPatch};
use crate::model::state::StoreState;

/// Result of reducing one operation against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    Changed(StoreState),
    /// Target exists but the operation leaves it as is.
    Unchanged,
    NotFound,
}

/// Appends `record` to the end of the record list.
///
/// No uniqueness check: a duplicate id is kept alongside the existing one.
pub fn add_record(state: &StoreState, record: Record) -> Reduction {
    let mut records = Vec::with_capacity(state.records().len() + 1);
    records.extend(state.records().iter().cloned());
    records.push(record);
    Reduction::Changed(state.with_records(records))
}

/// Removes the first record with `id`, keeping the order of the rest.
pub fn delete_record(state: &StoreState, id: RecordId) -> Reduction {
    let Some(index) = state.position(id) else {
        return Reduction::NotFound;
    };

    let records = state
        .records()
        .iter()
        .enumerate()
        .filter(|(position, _)| *position != index)
        .map(|(_, record)| record.clone())
        .collect();
    Reduction::Changed(state.with_records(records))
}

/// Applies `patch` to the first record with `id`.
pub fn update_record(state: &StoreState, id: RecordId, patch: &RecordPatch) -> Reduction {
    let Some(index) = state.position(id) else {
        return Reduction::NotFound;
    };
    let Some(updated) = state.records()[index].patched(patch) else {
        return Reduction::Unchanged;
    };

    let mut records = state.records().to_vec();
    records[index] = updated;
    Reduction::Changed(state.with_records(records))
}

//! Derived read-only views over a snapshot.

use crate::model::record::Record;
use crate::model::state::StoreState;
use std::sync::Arc;

/// Number of records in the snapshot.
pub fn select_users_count(state: &StoreState) -> usize {
    state.records().len()
}

/// Tag list handle; the same `Arc` for as long as tags are untouched.
pub fn select_cats(state: &StoreState) -> Arc<Vec<String>> {
    Arc::clone(state.cats())
}

/// Record list handle; replaced on every record change.
pub fn select_users(state: &StoreState) -> Arc<Vec<Record>> {
    Arc::clone(state.records())
}

//! JSON envelope codec for persisted snapshots.
//!
//! Stored shape:
//! `{"state":{"usuarios":[...],"cats":[...]},"version":0}`

use super::{PersistError, PersistResult};
use crate::model::record::Record;
use crate::model::state::StoreState;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: &'a StoreState,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope {
    state: PersistedState,
    /// Snapshots written without a version are treated as version 0.
    #[serde(default)]
    version: u32,
}

/// Decoded snapshot content.
///
/// Keys missing from the stored value stay `None` and keep the live
/// state's value on merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PersistedState {
    #[serde(default, rename = "usuarios")]
    pub records: Option<Vec<Record>>,
    #[serde(default)]
    pub cats: Option<Vec<String>>,
}

impl PersistedState {
    /// Shallow-merges stored keys over `current`.
    ///
    /// Lists absent from the stored value keep their `Arc` from `current`.
    pub fn merge_into(self, current: &StoreState) -> StoreState {
        let merged = match self.records {
            Some(records) => current.with_records(records),
            None => current.clone(),
        };
        match self.cats {
            Some(cats) => merged.with_cats(cats),
            None => merged,
        }
    }
}

/// Serializes a snapshot with its state version.
pub fn encode_state(state: &StoreState, version: u32) -> PersistResult<String> {
    serde_json::to_string(&EnvelopeRef { state, version }).map_err(PersistError::Encode)
}

/// Parses a stored value and checks its state version.
///
/// # Errors
/// - `Decode` when the value is not a valid envelope.
/// - `VersionMismatch` when the stored version differs from `expected_version`.
pub fn decode_state(raw: &str, expected_version: u32) -> PersistResult<PersistedState> {
    let envelope: Envelope = serde_json::from_str(raw).map_err(PersistError::Decode)?;
    if envelope.version != expected_version {
        return Err(PersistError::VersionMismatch {
            stored: envelope.version,
            expected: expected_version,
        });
    }
    Ok(envelope.state)
}

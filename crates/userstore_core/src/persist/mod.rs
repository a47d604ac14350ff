//! Snapshot persistence over a key-value storage.
//!
//! # Responsibility
//! - Save the full store state into one named slot after every change.
//! - Load and decode that slot during hydration.
//! - Define the hydration lifecycle observer contract.
//!
//! # Invariants
//! - Every save is a full overwrite of the slot, never incremental.
//! - A failed save is retried exactly once before being reported.
//! - Load errors are returned to the store, which recovers locally; they
//!   never reach store callers.
//! - A snapshot written for another state version is logged and ignored,
//!   as if the slot were empty.

use crate::model::state::StoreState;
use crate::storage::{KeyValueStorage, StorageError};
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod codec;

pub use codec::{decode_state, encode_state, PersistedState};

/// Slot name used when none is configured.
pub const DEFAULT_STORAGE_NAME: &str = "usuario-storage";
/// State version written into every snapshot.
pub const DEFAULT_STATE_VERSION: u32 = 0;
const WRITE_ATTEMPTS: usize = 2;

pub type PersistResult<T> = Result<T, PersistError>;

/// Persistence failure taxonomy.
#[derive(Debug)]
pub enum PersistError {
    Read(StorageError),
    Write(StorageError),
    Remove(StorageError),
    Encode(serde_json::Error),
    /// Stored value is not a valid snapshot envelope.
    Decode(serde_json::Error),
    /// Stored snapshot was written for another state version.
    VersionMismatch { stored: u32, expected: u32 },
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read persisted state: {err}"),
            Self::Write(err) => write!(f, "failed to write persisted state: {err}"),
            Self::Remove(err) => write!(f, "failed to clear persisted state: {err}"),
            Self::Encode(err) => write!(f, "failed to encode state: {err}"),
            Self::Decode(err) => write!(f, "persisted state is corrupt: {err}"),
            Self::VersionMismatch { stored, expected } => write!(
                f,
                "persisted state version {stored} does not match expected {expected}"
            ),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) | Self::Write(err) | Self::Remove(err) => Some(err),
            Self::Encode(err) | Self::Decode(err) => Some(err),
            Self::VersionMismatch { .. } => None,
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOptions {
    /// Storage key the snapshot lives under.
    pub name: String,
    /// Snapshot version; stored snapshots with another version are ignored.
    pub version: u32,
    /// When set, the store starts from defaults and waits for an explicit
    /// `rehydrate()`.
    pub skip_hydration: bool,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_STORAGE_NAME.to_string(),
            version: DEFAULT_STATE_VERSION,
            skip_hydration: false,
        }
    }
}

impl PersistOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Receives hydration lifecycle notifications.
///
/// Both methods default to no-ops so observers implement only what they
/// need.
pub trait HydrationObserver {
    fn hydration_started(&mut self, _name: &str) {}

    /// `Ok` carries the state the store ended up with; `Err` carries the
    /// reason the stored snapshot could not be read.
    fn hydration_finished(&mut self, _result: Result<&StoreState, &PersistError>) {}
}

/// Save/load pair bound to one storage slot.
pub struct PersistAdapter<S: KeyValueStorage> {
    storage: S,
    options: PersistOptions,
}

impl<S: KeyValueStorage> PersistAdapter<S> {
    pub fn new(storage: S, options: PersistOptions) -> Self {
        Self { storage, options }
    }

    pub fn options(&self) -> &PersistOptions {
        &self.options
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Reads and decodes the slot.
    ///
    /// `Ok(None)` means nothing usable was stored: the slot is empty or holds
    /// a snapshot for another state version.
    pub fn load(&self) -> PersistResult<Option<PersistedState>> {
        let Some(raw) = self
            .storage
            .get_item(&self.options.name)
            .map_err(PersistError::Read)?
        else {
            return Ok(None);
        };
        match decode_state(&raw, self.options.version) {
            Ok(stored) => Ok(Some(stored)),
            Err(err @ PersistError::VersionMismatch { .. }) => {
                error!(
                    "event=persist_read module=persist status=version_mismatch name={} error={err}",
                    self.options.name
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Serializes `state` and overwrites the slot, retrying once.
    pub fn save(&mut self, state: &StoreState) -> PersistResult<()> {
        let encoded = encode_state(state, self.options.version)?;

        let mut attempt = 1;
        loop {
            match self.storage.set_item(&self.options.name, &encoded) {
                Ok(()) => {
                    debug!(
                        "event=persist_write module=persist status=ok name={} bytes={} attempt={attempt}",
                        self.options.name,
                        encoded.len()
                    );
                    return Ok(());
                }
                Err(err) if attempt < WRITE_ATTEMPTS => {
                    warn!(
                        "event=persist_write module=persist status=retry name={} attempt={attempt} error={err}",
                        self.options.name
                    );
                    attempt += 1;
                }
                Err(err) => return Err(PersistError::Write(err)),
            }
        }
    }

    /// Removes the slot from storage.
    pub fn clear(&mut self) -> PersistResult<()> {
        self.storage
            .remove_item(&self.options.name)
            .map_err(PersistError::Remove)
    }
}

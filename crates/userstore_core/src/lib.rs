//! Core state container for the user roster.
//! This crate owns the record store, its persistence contract and the
//! storage backends it writes through.

pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod service;
pub mod storage;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::id::{Clock, RecordIdGenerator, SystemClock};
pub use model::record::{Record, RecordId, RecordPatch};
pub use model::state::{StoreState, DEFAULT_CATS};
pub use persist::{
    HydrationObserver, PersistError, PersistOptions, PersistResult, DEFAULT_STORAGE_NAME,
};
pub use service::user_service::UserService;
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage, StorageError, StorageResult};
pub use store::selectors::{select_cats, select_users, select_users_count};
pub use store::{MutationOutcome, RecordStore, Snapshot, StoreBuilder, SubscriptionId};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

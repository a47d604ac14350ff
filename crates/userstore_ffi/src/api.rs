//! FFI use-case API for UI-facing calls.
//!
//! # Responsibility
//! - Expose the roster operations and selectors to a UI shell via FRB.
//! - Keep error semantics simple: envelopes carry `ok` + message.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Each call hydrates a store from the storage file, applies one
//!   operation and lets the store persist it; no store outlives a call.

use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use userstore_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    MutationOutcome, Record, RecordStore, SqliteStorage, UserService,
};

const STORE_DB_FILE_NAME: &str = "userstore.sqlite3";
const STORE_DB_PATH_ENV: &str = "USERSTORE_DB_PATH";
static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One user row as shown by the UI list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserItem {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<Record> for UserItem {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
        }
    }
}

/// Action response envelope for add/delete/rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActionResponse {
    /// Whether the target existed and the operation completed.
    pub ok: bool,
    /// Affected user id when known.
    pub user_id: Option<i64>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl UserActionResponse {
    fn success(message: impl Into<String>, user_id: i64) -> Self {
        Self {
            ok: true,
            user_id: Some(user_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            user_id: None,
            message: message.into(),
        }
    }

    fn from_outcome(outcome: MutationOutcome, id: i64, applied: &str) -> Self {
        match outcome {
            MutationOutcome::Applied => Self::success(applied, id),
            MutationOutcome::Unchanged => Self::success("Nothing to change.", id),
            MutationOutcome::NotFound(missing) => Self {
                ok: false,
                user_id: Some(missing),
                message: format!("User {missing} not found."),
            },
        }
    }
}

/// Roster view: users plus the two derived selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListResponse {
    pub items: Vec<UserItem>,
    /// Same as `items.len()`; kept for the counter widget.
    pub total: u32,
    pub cats: Vec<String>,
    pub message: String,
}

/// Registers a user from form input.
///
/// # FFI contract
/// - Sync call, storage-backed execution.
/// - Returns the generated user id on success.
#[flutter_rust_bridge::frb(sync)]
pub fn users_add(name: String, email: String) -> UserActionResponse {
    match with_user_service(|service| service.register(name, email).id) {
        Ok(id) => UserActionResponse::success("User added.", id),
        Err(err) => UserActionResponse::failure(format!("users_add failed: {err}")),
    }
}

/// Deletes a user; a missing id yields `ok=false` without side effects.
#[flutter_rust_bridge::frb(sync)]
pub fn users_delete(id: i64) -> UserActionResponse {
    match with_user_service(|service| service.remove(id)) {
        Ok(outcome) => UserActionResponse::from_outcome(outcome, id, "User deleted."),
        Err(err) => UserActionResponse::failure(format!("users_delete failed: {err}")),
    }
}

/// Replaces a user's name; email is left untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn users_rename(id: i64, name: String) -> UserActionResponse {
    match with_user_service(|service| service.rename(id, name)) {
        Ok(outcome) => UserActionResponse::from_outcome(outcome, id, "User renamed."),
        Err(err) => UserActionResponse::failure(format!("users_rename failed: {err}")),
    }
}

/// Lists users in insertion order with count and cats.
#[flutter_rust_bridge::frb(sync)]
pub fn users_list() -> UserListResponse {
    let result = with_user_service(|service| {
        let items = service
            .users()
            .iter()
            .cloned()
            .map(UserItem::from)
            .collect::<Vec<_>>();
        (items, service.cats().to_vec())
    });
    match result {
        Ok((items, cats)) => UserListResponse {
            total: u32::try_from(items.len()).unwrap_or(u32::MAX),
            message: format!("{} user(s).", items.len()),
            items,
            cats,
        },
        Err(err) => UserListResponse {
            items: Vec::new(),
            total: 0,
            cats: Vec::new(),
            message: format!("users_list failed: {err}"),
        },
    }
}

/// Record-count selector; returns 0 when storage cannot be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn users_count() -> u32 {
    with_user_service(|service| service.user_count())
        .map(|count| u32::try_from(count).unwrap_or(u32::MAX))
        .unwrap_or_else(|err| {
            warn!("event=users_count module=ffi status=error error={err}");
            0
        })
}

/// Tag-list selector; returns an empty list when storage cannot be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn users_cats() -> Vec<String> {
    with_user_service(|service| service.cats().to_vec()).unwrap_or_else(|err| {
        warn!("event=users_cats module=ffi status=error error={err}");
        Vec::new()
    })
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(STORE_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_DB_FILE_NAME)
        })
        .clone()
}

fn with_user_service<T>(
    f: impl FnOnce(&mut UserService<SqliteStorage>) -> T,
) -> Result<T, String> {
    let db_path = resolve_store_db_path();
    let storage =
        SqliteStorage::open(&db_path).map_err(|err| format!("store DB open failed: {err}"))?;
    let mut service = UserService::new(RecordStore::new(storage));
    let result = f(&mut service);
    match service.store().last_write_error() {
        Some(err) => Err(err.to_string()),
        None => Ok(result),
    }
}

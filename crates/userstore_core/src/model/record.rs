//! User record model.
//!
//! # Responsibility
//! - Define the canonical user record kept by the store.
//! - Define partial-update patches applied by `update`.
//!
//! # Invariants
//! - `id` is never changed by a patch.
//! - Wire field names stay compatible with persisted snapshots
//!   (`id`, `nombre`, `email`).

use serde::{Deserialize, Serialize};

/// Stable identifier for one user record.
///
/// Epoch-millisecond derived when issued by `RecordIdGenerator`, but any
/// caller-supplied integer is accepted by the store.
pub type RecordId = i64;

/// One user entry in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// Serialized as `nombre` to match persisted snapshots.
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
}

impl Record {
    pub fn new(id: RecordId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Returns a copy of this record with the patch fields applied.
    ///
    /// Returns `None` when the patch would not change anything, so callers
    /// can keep the original value (and its snapshot) untouched.
    pub fn patched(&self, patch: &RecordPatch) -> Option<Self> {
        let name_changed = patch.name.as_ref().is_some_and(|name| *name != self.name);
        let email_changed = patch
            .email
            .as_ref()
            .is_some_and(|email| *email != self.email);
        if !name_changed && !email_changed {
            return None;
        }

        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name.clone_from(name);
        }
        if let Some(email) = &patch.email {
            next.email.clone_from(email);
        }
        Some(next)
    }
}

/// Partial field replacement for an existing record.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl RecordPatch {
    /// Patch that only replaces `name`.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: None,
        }
    }

    /// Patch that only replaces `email`.
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: Some(email.into()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

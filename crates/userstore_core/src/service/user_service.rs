//! User roster use-case service.
//!
//! # Responsibility
//! - Register users with freshly generated ids.
//! - Rename and remove users by id.
//! - Expose the count/cats selectors to UI callers.
//!
//! # Invariants
//! - Generated ids are unique within the store, even when two users are
//!   registered within the same millisecond or after hydration.
//! - Service APIs never bypass the store; every change is persisted and
//!   published by `RecordStore`.

use crate::model::id::{Clock, RecordIdGenerator, SystemClock};
use crate::model::record::{Record, RecordId, RecordPatch};
use crate::storage::KeyValueStorage;
use crate::store::{MutationOutcome, RecordStore};
use std::sync::Arc;

/// Use-case facade over one `RecordStore`.
pub struct UserService<S: KeyValueStorage, C: Clock = SystemClock> {
    store: RecordStore<S>,
    ids: RecordIdGenerator<C>,
}

impl<S: KeyValueStorage> UserService<S, SystemClock> {
    pub fn new(store: RecordStore<S>) -> Self {
        Self::with_id_generator(store, RecordIdGenerator::new())
    }
}

impl<S: KeyValueStorage, C: Clock> UserService<S, C> {
    pub fn with_id_generator(store: RecordStore<S>, ids: RecordIdGenerator<C>) -> Self {
        Self { store, ids }
    }

    /// Creates a user from form input and appends it to the roster.
    ///
    /// # Contract
    /// - Returns the stored record including its generated id.
    /// - Name and email are stored as given; the form owns validation.
    pub fn register(&mut self, name: impl Into<String>, email: impl Into<String>) -> Record {
        let id = self.ids.next_id(self.store.state().max_id());
        let record = Record::new(id, name, email);
        self.store.add(record.clone());
        record
    }

    /// Replaces the name of the user with `id`.
    pub fn rename(&mut self, id: RecordId, name: impl Into<String>) -> MutationOutcome {
        self.store.update(id, RecordPatch::name(name))
    }

    /// Applies an arbitrary patch to the user with `id`.
    pub fn update(&mut self, id: RecordId, patch: RecordPatch) -> MutationOutcome {
        self.store.update(id, patch)
    }

    pub fn remove(&mut self, id: RecordId) -> MutationOutcome {
        self.store.delete(id)
    }

    pub fn find(&self, id: RecordId) -> Option<&Record> {
        self.store.state().find(id)
    }

    pub fn users(&self) -> &[Record] {
        self.store.records()
    }

    pub fn user_count(&self) -> usize {
        self.store.user_count()
    }

    pub fn cats(&self) -> Arc<Vec<String>> {
        self.store.cats()
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore<S> {
        &mut self.store
    }

    pub fn into_store(self) -> RecordStore<S> {
        self.store
    }
}

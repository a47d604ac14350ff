//! Record store: state container, mutations, subscriptions and hydration.
//!
//! # Responsibility
//! - Own the current immutable snapshot and replace it on every change.
//! - Persist each new snapshot and then notify subscribers.
//! - Restore state from storage on construction (or on `rehydrate`).
//!
//! # Invariants
//! - Snapshots are never mutated in place; `Arc::ptr_eq` on a sub-list is a
//!   valid "unchanged" test between consecutive snapshots.
//! - Operations on a missing id leave state untouched, skip persistence and
//!   notify nobody.
//! - An update that finds its record but changes nothing still rewrites the
//!   slot; it publishes no snapshot and notifies nobody.
//! - Persistence failures never fail an operation; the last one is kept in
//!   `last_write_error`.
//! - A failed first hydration resets the store to the default state; a
//!   failed later `rehydrate` keeps the live state.

use crate::model::record::{Record, RecordId, RecordPatch};
use crate::model::state::StoreState;
use crate::persist::{HydrationObserver, PersistAdapter, PersistError, PersistOptions};
use crate::storage::KeyValueStorage;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;

pub mod reducer;
pub mod selectors;

use reducer::Reduction;

/// Shared handle to one immutable state snapshot.
pub type Snapshot = Arc<StoreState>;

type Listener = Box<dyn FnMut(&Snapshot, &Snapshot)>;

/// Handle returned by `subscribe*`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// What a mutation did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// A new snapshot was produced, persisted and published.
    Applied,
    /// Target found, but the operation changed nothing. The slot is still
    /// rewritten; no snapshot is published.
    Unchanged,
    /// No record with this id; state untouched.
    NotFound(RecordId),
}

impl MutationOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }

    fn label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Unchanged => "unchanged",
            Self::NotFound(_) => "not_found",
        }
    }
}

/// Builder for `RecordStore`; observers attached here see the startup
/// hydration events.
pub struct StoreBuilder<S: KeyValueStorage> {
    storage: S,
    options: PersistOptions,
    observers: Vec<Box<dyn HydrationObserver>>,
}

impl<S: KeyValueStorage> StoreBuilder<S> {
    pub fn options(mut self, options: PersistOptions) -> Self {
        self.options = options;
        self
    }

    pub fn observer(mut self, observer: impl HydrationObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Creates the store and hydrates it unless `skip_hydration` is set.
    pub fn build(self) -> RecordStore<S> {
        let skip_hydration = self.options.skip_hydration;
        let mut store = RecordStore {
            state: Arc::new(StoreState::default()),
            persist: PersistAdapter::new(self.storage, self.options),
            listeners: Vec::new(),
            next_subscription: 0,
            observers: self.observers,
            has_hydrated: false,
            last_write_error: None,
        };
        if !skip_hydration {
            store.rehydrate();
        }
        store
    }
}

/// Ordered user records plus tags, persisted after every change.
pub struct RecordStore<S: KeyValueStorage> {
    state: Snapshot,
    persist: PersistAdapter<S>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    observers: Vec<Box<dyn HydrationObserver>>,
    has_hydrated: bool,
    last_write_error: Option<PersistError>,
}

impl<S: KeyValueStorage> RecordStore<S> {
    pub fn builder(storage: S) -> StoreBuilder<S> {
        StoreBuilder {
            storage,
            options: PersistOptions::default(),
            observers: Vec::new(),
        }
    }

    /// Creates a store with default options and hydrates it from `storage`.
    pub fn new(storage: S) -> Self {
        Self::builder(storage).build()
    }

    pub fn with_options(storage: S, options: PersistOptions) -> Self {
        Self::builder(storage).options(options).build()
    }

    /// Current snapshot.
    pub fn state(&self) -> &Snapshot {
        &self.state
    }

    pub fn records(&self) -> &[Record] {
        self.state.records()
    }

    pub fn user_count(&self) -> usize {
        selectors::select_users_count(&self.state)
    }

    pub fn cats(&self) -> Arc<Vec<String>> {
        selectors::select_cats(&self.state)
    }

    /// Appends a fully formed record. Duplicate ids are not rejected.
    pub fn add(&mut self, record: Record) -> MutationOutcome {
        let id = record.id;
        let reduction = reducer::add_record(&self.state, record);
        self.apply("add_user", id, reduction)
    }

    /// Removes the first record with `id`.
    pub fn delete(&mut self, id: RecordId) -> MutationOutcome {
        let reduction = reducer::delete_record(&self.state, id);
        self.apply("delete_user", id, reduction)
    }

    /// Overwrites the patch fields of the first record with `id`.
    pub fn update(&mut self, id: RecordId, patch: RecordPatch) -> MutationOutcome {
        let reduction = reducer::update_record(&self.state, id, &patch);
        self.apply("update_user", id, reduction)
    }

    /// Registers a listener called with `(next, previous)` after each change.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&Snapshot, &Snapshot) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Registers a listener that only fires when `selector`'s output
    /// changes according to `is_equal`.
    ///
    /// The listener receives `(next, previous)` selected values.
    pub fn subscribe_selector<T, Sel, E, L>(
        &mut self,
        selector: Sel,
        is_equal: E,
        mut listener: L,
    ) -> SubscriptionId
    where
        T: 'static,
        Sel: Fn(&StoreState) -> T + 'static,
        E: Fn(&T, &T) -> bool + 'static,
        L: FnMut(&T, &T) + 'static,
    {
        let mut current = selector(self.state.as_ref());
        self.subscribe(move |next, _previous| {
            let selected = selector(next.as_ref());
            if !is_equal(&current, &selected) {
                let previous = std::mem::replace(&mut current, selected);
                listener(&current, &previous);
            }
        })
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn add_hydration_observer(&mut self, observer: impl HydrationObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Restores state from storage.
    ///
    /// Stored keys are shallow-merged over the current state. On read or
    /// decode failure during the first hydration the store falls back to the
    /// default state; after that a failure leaves the live state alone. The
    /// error only reaches observers and the log.
    pub fn rehydrate(&mut self) {
        let started_at = Instant::now();
        let name = self.persist.options().name.clone();
        info!("event=hydrate module=store status=start name={name}");
        for observer in &mut self.observers {
            observer.hydration_started(&name);
        }

        match self.persist.load() {
            Ok(stored) => {
                if let Some(stored) = stored {
                    let next = stored.merge_into(&self.state);
                    self.replace_state(next);
                }
                self.has_hydrated = true;
                info!(
                    "event=hydrate module=store status=ok name={name} records={} duration_ms={}",
                    self.state.records().len(),
                    started_at.elapsed().as_millis()
                );
                for observer in &mut self.observers {
                    observer.hydration_finished(Ok(&*self.state));
                }
            }
            Err(err) => {
                let fallback = !self.has_hydrated;
                if fallback {
                    self.replace_state(StoreState::default());
                }
                self.has_hydrated = true;
                error!(
                    "event=hydrate module=store status=error name={name} fallback={fallback} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                for observer in &mut self.observers {
                    observer.hydration_finished(Err(&err));
                }
            }
        }
    }

    /// Whether at least one hydration pass has finished.
    pub fn has_hydrated(&self) -> bool {
        self.has_hydrated
    }

    /// Removes the persisted slot; in-memory state is kept.
    pub fn clear_storage(&mut self) -> Result<(), PersistError> {
        self.persist.clear()?;
        info!(
            "event=clear_storage module=store status=ok name={}",
            self.persist.options().name
        );
        Ok(())
    }

    /// Error from the most recent failed write, cleared by the next
    /// successful one.
    pub fn last_write_error(&self) -> Option<&PersistError> {
        self.last_write_error.as_ref()
    }

    pub fn persist_options(&self) -> &PersistOptions {
        self.persist.options()
    }

    pub fn storage(&self) -> &S {
        self.persist.storage()
    }

    pub fn storage_mut(&mut self) -> &mut S {
        self.persist.storage_mut()
    }

    pub fn into_storage(self) -> S {
        self.persist.into_storage()
    }

    fn apply(
        &mut self,
        action: &'static str,
        id: RecordId,
        reduction: Reduction,
    ) -> MutationOutcome {
        let outcome = match reduction {
            Reduction::Changed(next) => {
                self.commit(next);
                MutationOutcome::Applied
            }
            Reduction::Unchanged => {
                self.persist_state();
                MutationOutcome::Unchanged
            }
            Reduction::NotFound => MutationOutcome::NotFound(id),
        };
        debug!(
            "event=store_action module=store action={action} id={id} outcome={} records={}",
            outcome.label(),
            self.state.records().len()
        );
        outcome
    }

    /// Publishes `next`, persists it, then notifies listeners.
    fn commit(&mut self, next: StoreState) {
        let previous = std::mem::replace(&mut self.state, Arc::new(next));
        self.persist_state();
        self.notify(&previous);
    }

    /// Writes the current snapshot and records the outcome.
    fn persist_state(&mut self) {
        match self.persist.save(&self.state) {
            Ok(()) => self.last_write_error = None,
            Err(err) => {
                warn!(
                    "event=persist_write module=store status=error name={} error={err}",
                    self.persist.options().name
                );
                self.last_write_error = Some(err);
            }
        }
    }

    /// Swaps state without persisting (hydration path).
    fn replace_state(&mut self, next: StoreState) {
        if *self.state == next {
            return;
        }
        let previous = std::mem::replace(&mut self.state, Arc::new(next));
        self.notify(&previous);
    }

    fn notify(&mut self, previous: &Snapshot) {
        for (_, listener) in &mut self.listeners {
            listener(&self.state, previous);
        }
    }
}

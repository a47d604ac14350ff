use std::cell::RefCell;
use std::rc::Rc;
use userstore_core::{
    HydrationObserver, KeyValueStorage, MemoryStorage, MutationOutcome, PersistError,
    PersistOptions, Record, RecordPatch, RecordStore, StorageError, StorageResult, StoreState,
    DEFAULT_STORAGE_NAME,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum HydrationEvent {
    Started(String),
    Finished { ok: bool, records: usize },
}

/// Records hydration notifications into a shared log.
#[derive(Clone, Default)]
struct EventLog(Rc<RefCell<Vec<HydrationEvent>>>);

impl EventLog {
    fn events(&self) -> Vec<HydrationEvent> {
        self.0.borrow().clone()
    }
}

impl HydrationObserver for EventLog {
    fn hydration_started(&mut self, name: &str) {
        self.0
            .borrow_mut()
            .push(HydrationEvent::Started(name.to_string()));
    }

    fn hydration_finished(&mut self, result: Result<&StoreState, &PersistError>) {
        let event = match result {
            Ok(state) => HydrationEvent::Finished {
                ok: true,
                records: state.records().len(),
            },
            Err(_) => HydrationEvent::Finished {
                ok: false,
                records: 0,
            },
        };
        self.0.borrow_mut().push(event);
    }
}

/// Storage whose writes always fail; reads delegate to memory.
struct ReadOnlyStorage {
    inner: MemoryStorage,
    write_calls: usize,
}

impl KeyValueStorage for ReadOnlyStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&mut self, _key: &str, _value: &str) -> StorageResult<()> {
        self.write_calls += 1;
        Err(StorageError::Unavailable("read-only medium".to_string()))
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.inner.remove_item(key)
    }
}

/// Memory storage whose reads and writes can be switched to fail.
#[derive(Default)]
struct FaultyStorage {
    inner: MemoryStorage,
    fail_reads: bool,
    fail_writes: bool,
}

impl KeyValueStorage for FaultyStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        if self.fail_reads {
            return Err(StorageError::Unavailable("database is locked".to_string()));
        }
        self.inner.get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("quota".to_string()));
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.inner.remove_item(key)
    }
}

struct UnreadableStorage;

impl KeyValueStorage for UnreadableStorage {
    fn get_item(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable("access denied".to_string()))
    }

    fn set_item(&mut self, _key: &str, _value: &str) -> StorageResult<()> {
        Ok(())
    }

    fn remove_item(&mut self, _key: &str) -> StorageResult<()> {
        Ok(())
    }
}

#[test]
fn every_change_overwrites_the_slot() {
    let mut store = RecordStore::new(MemoryStorage::new());
    store.add(Record::new(1, "Ana", "a@x.com"));
    store.add(Record::new(2, "Luis", "l@x.com"));
    store.update(1, RecordPatch::name("Beatriz"));

    let raw = store
        .storage()
        .get_item(DEFAULT_STORAGE_NAME)
        .unwrap()
        .expect("slot should be written");
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["version"], 0);
    assert_eq!(json["state"]["usuarios"][0]["nombre"], "Beatriz");
    assert_eq!(json["state"]["usuarios"][1]["id"], 2);
    assert_eq!(json["state"]["cats"], serde_json::json!(["rojizo"]));
    assert_eq!(store.storage().len(), 1);
}

#[test]
fn restart_restores_previous_session() {
    let mut store = RecordStore::new(MemoryStorage::new());
    store.add(Record::new(1, "Ana", "a@x.com"));
    store.add(Record::new(2, "Luis", "l@x.com"));
    store.delete(1);
    let expected = store.state().as_ref().clone();

    let log = EventLog::default();
    let restored = RecordStore::builder(store.into_storage())
        .observer(log.clone())
        .build();

    assert!(restored.has_hydrated());
    assert_eq!(restored.state().as_ref(), &expected);
    assert_eq!(
        log.events(),
        vec![
            HydrationEvent::Started(DEFAULT_STORAGE_NAME.to_string()),
            HydrationEvent::Finished {
                ok: true,
                records: 1
            },
        ]
    );
}

#[test]
fn corrupt_slot_falls_back_to_defaults_and_reports_failure() {
    let storage = MemoryStorage::with_item(DEFAULT_STORAGE_NAME, "{\"state\": [oops");
    let log = EventLog::default();

    let store = RecordStore::builder(storage).observer(log.clone()).build();

    assert!(store.records().is_empty());
    assert_eq!(store.cats().as_slice(), ["rojizo".to_string()]);
    assert_eq!(store.state().as_ref(), &StoreState::default());
    assert!(store.has_hydrated());
    assert_eq!(
        log.events().last(),
        Some(&HydrationEvent::Finished {
            ok: false,
            records: 0
        })
    );
}

#[test]
fn snapshot_for_other_version_is_ignored() {
    let storage = MemoryStorage::with_item(
        DEFAULT_STORAGE_NAME,
        r#"{"state":{"usuarios":[{"id":1,"nombre":"Ana","email":"a@x.com"}]},"version":4}"#,
    );
    let log = EventLog::default();

    let mut store = RecordStore::builder(storage).observer(log.clone()).build();

    assert_eq!(store.state().as_ref(), &StoreState::default());
    assert_eq!(
        log.events().last(),
        Some(&HydrationEvent::Finished {
            ok: true,
            records: 0
        })
    );

    store.add(Record::new(2, "Luis", "l@x.com"));
    let raw = store
        .storage()
        .get_item(DEFAULT_STORAGE_NAME)
        .unwrap()
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["version"], 0);
    assert_eq!(json["state"]["usuarios"][0]["id"], 2);
}

#[test]
fn unreadable_storage_does_not_crash_the_store() {
    let log = EventLog::default();
    let mut store = RecordStore::builder(UnreadableStorage)
        .observer(log.clone())
        .build();

    assert_eq!(store.state().as_ref(), &StoreState::default());
    assert!(matches!(
        log.events().last(),
        Some(HydrationEvent::Finished { ok: false, .. })
    ));

    store.add(Record::new(1, "Ana", "a@x.com"));
    assert_eq!(store.user_count(), 1);
}

#[test]
fn stored_keys_are_merged_over_defaults() {
    let storage = MemoryStorage::with_item(
        DEFAULT_STORAGE_NAME,
        r#"{"state":{"usuarios":[{"id":3,"nombre":"Eva","email":"e@x.com"}]},"version":0}"#,
    );

    let store = RecordStore::new(storage);

    assert_eq!(store.records(), &[Record::new(3, "Eva", "e@x.com")]);
    assert_eq!(store.cats().as_slice(), ["rojizo".to_string()]);
}

#[test]
fn custom_slot_name_and_version_are_used() {
    let options = PersistOptions {
        name: "roster".to_string(),
        version: 2,
        skip_hydration: false,
    };
    let mut store = RecordStore::with_options(MemoryStorage::new(), options.clone());
    store.add(Record::new(1, "Ana", "a@x.com"));

    let storage = store.into_storage();
    assert!(storage.get_item(DEFAULT_STORAGE_NAME).unwrap().is_none());
    let raw = storage.get_item("roster").unwrap().unwrap();
    assert!(raw.contains("\"version\":2"));

    let restored = RecordStore::with_options(storage, options);
    assert_eq!(restored.user_count(), 1);
}

#[test]
fn skip_hydration_waits_for_explicit_rehydrate() {
    let mut seed = RecordStore::new(MemoryStorage::new());
    seed.add(Record::new(1, "Ana", "a@x.com"));
    let storage = seed.into_storage();

    let log = EventLog::default();
    let mut store = RecordStore::builder(storage)
        .options(PersistOptions {
            skip_hydration: true,
            ..PersistOptions::default()
        })
        .observer(log.clone())
        .build();
    assert!(!store.has_hydrated());
    assert_eq!(store.user_count(), 0);
    assert!(log.events().is_empty());

    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    store.subscribe(move |_, _| *counter.borrow_mut() += 1);

    store.rehydrate();
    assert!(store.has_hydrated());
    assert_eq!(store.user_count(), 1);
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(log.events().len(), 2);
}

#[test]
fn write_failure_keeps_state_and_surfaces_warning() {
    let storage = ReadOnlyStorage {
        inner: MemoryStorage::new(),
        write_calls: 0,
    };
    let mut store = RecordStore::new(storage);

    assert!(store.add(Record::new(1, "Ana", "a@x.com")).is_applied());

    assert_eq!(store.user_count(), 1);
    assert!(matches!(
        store.last_write_error(),
        Some(PersistError::Write(StorageError::Unavailable(_)))
    ));
    assert_eq!(store.storage().write_calls, 2);
}

#[test]
fn successful_write_clears_previous_write_error() {
    let storage: Box<dyn KeyValueStorage> = Box::new(ReadOnlyStorage {
        inner: MemoryStorage::new(),
        write_calls: 0,
    });
    let mut store = RecordStore::new(storage);
    store.add(Record::new(1, "Ana", "a@x.com"));
    assert!(store.last_write_error().is_some());

    *store.storage_mut() = Box::new(MemoryStorage::new());
    store.add(Record::new(2, "Luis", "l@x.com"));
    assert!(store.last_write_error().is_none());
}

#[test]
fn unchanged_update_rewrites_stale_slot() {
    let mut store = RecordStore::new(FaultyStorage::default());
    store.add(Record::new(1, "Ana", "a@x.com"));

    store.storage_mut().fail_writes = true;
    assert!(store.update(1, RecordPatch::name("Beatriz")).is_applied());
    assert!(store.last_write_error().is_some());

    store.storage_mut().fail_writes = false;
    let calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&calls);
    store.subscribe(move |_, _| *counter.borrow_mut() += 1);

    assert_eq!(
        store.update(1, RecordPatch::name("Beatriz")),
        MutationOutcome::Unchanged
    );
    assert!(store.last_write_error().is_none());
    assert_eq!(*calls.borrow(), 0);

    let restored = RecordStore::new(store.into_storage());
    assert_eq!(restored.records(), &[Record::new(1, "Beatriz", "a@x.com")]);
}

#[test]
fn failed_rehydrate_keeps_live_state() {
    let log = EventLog::default();
    let mut store = RecordStore::builder(FaultyStorage::default())
        .observer(log.clone())
        .build();
    store.add(Record::new(1, "Ana", "a@x.com"));
    store.add(Record::new(2, "Luis", "l@x.com"));

    store.storage_mut().fail_reads = true;
    store.rehydrate();

    assert_eq!(store.user_count(), 2);
    assert_eq!(
        log.events().last(),
        Some(&HydrationEvent::Finished {
            ok: false,
            records: 0
        })
    );

    store.storage_mut().fail_reads = false;
    store.add(Record::new(3, "Eva", "e@x.com"));

    let restored = RecordStore::new(store.into_storage());
    assert_eq!(restored.user_count(), 3);
}

#[test]
fn clear_storage_removes_slot_but_keeps_state() {
    let mut store = RecordStore::new(MemoryStorage::new());
    store.add(Record::new(1, "Ana", "a@x.com"));

    store.clear_storage().unwrap();

    assert_eq!(store.user_count(), 1);
    assert!(store.storage().is_empty());

    let fresh = RecordStore::new(store.into_storage());
    assert_eq!(fresh.user_count(), 0);
}

#[test]
fn late_observer_sees_manual_rehydrate() {
    let mut store = RecordStore::new(MemoryStorage::new());
    let log = EventLog::default();
    store.add_hydration_observer(log.clone());

    store.rehydrate();

    assert_eq!(log.events().len(), 2);
}

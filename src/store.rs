// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub mod json;
pub mod sqlite;

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::time::Instant;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::json::JsonBackend;
use crate::store::sqlite::SqliteBackend;
use crate::types::card_id::CardId;
use crate::types::progress::MIN_EASE;
use crate::types::progress::ProgressRecord;

/// Durable storage for the whole progress collection.
pub trait Backend: Send + Sync {
    /// Human-readable location, used in error messages.
    fn location(&self) -> String;

    fn read_all(&self) -> Fallible<Vec<ProgressRecord>>;

    /// Replace the durable collection. Must be atomic: on failure the
    /// previously written collection is left as it was.
    fn write_all(&self, records: &[ProgressRecord]) -> Fallible<()>;
}

/// Pick a backend from the file extension.
pub fn backend_for(path: &Path) -> Fallible<Box<dyn Backend>> {
    let ext = path.extension().and_then(|ext| ext.to_str());
    match ext {
        Some("db" | "sqlite" | "sqlite3") => Ok(Box::new(SqliteBackend::new(path)?)),
        _ => Ok(Box::new(JsonBackend::new(path))),
    }
}

type Records = BTreeMap<CardId, Arc<Mutex<ProgressRecord>>>;

/// The in-memory progress collection, backed by durable storage.
///
/// Each record has its own lock, so updates to different cards never wait on
/// each other, and the map lock is only held long enough to find a record.
pub struct ProgressStore {
    backend: Box<dyn Backend>,
    min_ease: f64,
    records: RwLock<Records>,
    /// Serializes writes to the backend.
    writer: Mutex<()>,
}

impl ProgressStore {
    pub fn open(path: &Path) -> Fallible<Self> {
        Self::open_with(path, MIN_EASE)
    }

    /// Open a store whose records may have ease factors down to `min_ease`.
    pub fn open_with(path: &Path, min_ease: f64) -> Fallible<Self> {
        Self::with_backend(backend_for(path)?, min_ease)
    }

    pub fn with_backend(backend: Box<dyn Backend>, min_ease: f64) -> Fallible<Self> {
        let store = Self {
            backend,
            min_ease,
            records: RwLock::new(BTreeMap::new()),
            writer: Mutex::new(()),
        };
        store.load()?;
        Ok(store)
    }

    pub fn location(&self) -> String {
        self.backend.location()
    }

    /// Read every record from durable storage, replacing the in-memory state.
    pub fn load(&self) -> Fallible<BTreeMap<CardId, ProgressRecord>> {
        log::debug!("Loading progress from {}...", self.location());
        let start = Instant::now();
        let loaded = self.backend.read_all()?;
        let mut records = BTreeMap::new();
        for mut record in loaded {
            self.raise_to_floor(&mut record)?;
            if let Err(reason) = record.validate(self.min_ease) {
                return Err(ErrorReport::store_io(
                    "load progress",
                    self.location(),
                    reason,
                ));
            }
            let id = record.id;
            if records.insert(id, record).is_some() {
                return Err(ErrorReport::store_io(
                    "load progress",
                    self.location(),
                    format!("card {id} appears more than once"),
                ));
            }
        }
        *self.write() = records
            .iter()
            .map(|(id, record)| (*id, Arc::new(Mutex::new(record.clone()))))
            .collect();
        let duration = start.elapsed().as_millis();
        log::debug!("Loaded {} records in {duration}ms.", records.len());
        Ok(records)
    }

    pub fn get(&self, id: CardId) -> Fallible<ProgressRecord> {
        let cell = self.cell(id, "get")?;
        let record = lock_record(&cell).clone();
        Ok(record)
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Insert or overwrite the record for `record.id`.
    pub fn upsert(&self, record: ProgressRecord) {
        let existing = self.read().get(&record.id).cloned();
        match existing {
            Some(cell) => *lock_record(&cell) = record,
            None => {
                let mut records = self.write();
                match records.get(&record.id) {
                    // Someone else inserted it in the meantime.
                    Some(cell) => *lock_record(cell) = record,
                    None => {
                        records.insert(record.id, Arc::new(Mutex::new(record)));
                    }
                }
            }
        }
    }

    /// Read-modify-write a single record. Concurrent calls for the same card
    /// run one after another; calls for different cards do not block each
    /// other.
    ///
    /// `f` may return anything that holds the new record, such as a
    /// [`Scheduled`](crate::scheduler::Scheduled), which is handed back to
    /// the caller.
    pub fn modify<T, F>(&self, id: CardId, f: F) -> Fallible<T>
    where
        T: AsRef<ProgressRecord>,
        F: FnOnce(&ProgressRecord) -> Fallible<T>,
    {
        let cell = self.cell(id, "modify")?;
        let mut guard = lock_record(&cell);
        let next = f(&guard)?;
        let record = next.as_ref();
        if record.id != id {
            return fail(format!("card {id} cannot be renamed to {}.", record.id));
        }
        *guard = record.clone();
        Ok(next)
    }

    /// A copy of every record currently in memory.
    pub fn snapshot(&self) -> BTreeMap<CardId, ProgressRecord> {
        let cells: Vec<Arc<Mutex<ProgressRecord>>> = self.read().values().cloned().collect();
        cells
            .iter()
            .map(|cell| {
                let record = lock_record(cell).clone();
                (record.id, record)
            })
            .collect()
    }

    /// Persist `records` as the complete collection and make it the
    /// in-memory state. On failure neither the durable nor the in-memory
    /// state changes.
    pub fn save_all(&self, records: &BTreeMap<CardId, ProgressRecord>) -> Fallible<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.persist(records)?;
        *self.write() = records
            .iter()
            .map(|(id, record)| (*id, Arc::new(Mutex::new(record.clone()))))
            .collect();
        Ok(())
    }

    /// Persist the current in-memory state.
    pub fn save(&self) -> Fallible<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let records = self.snapshot();
        self.persist(&records)
    }

    /// Create a fresh record for every card that does not have one yet,
    /// leaving existing records untouched. Returns the full collection.
    pub fn bootstrap(&self, ids: &[CardId]) -> BTreeMap<CardId, ProgressRecord> {
        self.bootstrap_with(ids, ProgressRecord::new)
    }

    /// Like [`ProgressStore::bootstrap`], with a custom initial record.
    pub fn bootstrap_with<F>(&self, ids: &[CardId], make: F) -> BTreeMap<CardId, ProgressRecord>
    where
        F: Fn(CardId) -> ProgressRecord,
    {
        let mut added = 0;
        {
            let mut records = self.write();
            for &id in ids {
                records.entry(id).or_insert_with(|| {
                    added += 1;
                    let mut record = make(id);
                    record.id = id;
                    Arc::new(Mutex::new(record))
                });
            }
        }
        log::debug!("Bootstrapped {added} new records.");
        self.snapshot()
    }

    /// Drop the records of cards that are not in `known`, returning the IDs
    /// that were removed in ascending order.
    pub fn retain(&self, known: &HashSet<CardId>) -> Vec<CardId> {
        let mut records = self.write();
        let removed: Vec<CardId> = records
            .keys()
            .filter(|id| !known.contains(id))
            .copied()
            .collect();
        for id in &removed {
            records.remove(id);
        }
        if !removed.is_empty() {
            log::info!("Removed {} orphaned records.", removed.len());
        }
        removed
    }

    /// A stored ease factor below the configured floor was valid under an
    /// older policy, so it is raised rather than rejected.
    fn raise_to_floor(&self, record: &mut ProgressRecord) -> Fallible<()> {
        let ease = record.ease_factor;
        if !ease.is_finite() || ease <= 0.0 {
            return Err(ErrorReport::store_io(
                "load progress",
                self.location(),
                format!("card {}: invalid ease factor {ease}", record.id),
            ));
        }
        if ease < self.min_ease {
            log::info!(
                "Raising ease factor of card {} from {ease} to {}.",
                record.id,
                self.min_ease
            );
            record.ease_factor = self.min_ease;
        }
        Ok(())
    }

    fn persist(&self, records: &BTreeMap<CardId, ProgressRecord>) -> Fallible<()> {
        let mut rows = Vec::with_capacity(records.len());
        for (id, record) in records {
            if *id != record.id {
                return Err(ErrorReport::store_io(
                    "save progress",
                    self.location(),
                    format!("record for card {} is keyed as card {id}", record.id),
                ));
            }
            if let Err(reason) = record.validate(self.min_ease) {
                return Err(ErrorReport::store_io(
                    "save progress",
                    self.location(),
                    reason,
                ));
            }
            rows.push(record.clone());
        }
        log::debug!("Writing {} records to {}", rows.len(), self.location());
        self.backend.write_all(&rows)
    }

    fn cell(&self, id: CardId, operation: &'static str) -> Fallible<Arc<Mutex<ProgressRecord>>> {
        self.read()
            .get(&id)
            .cloned()
            .ok_or_else(|| ErrorReport::not_found(id, operation))
    }

    fn read(&self) -> RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Records> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock_record(cell: &Mutex<ProgressRecord>) -> MutexGuard<'_, ProgressRecord> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

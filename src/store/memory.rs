//! In-memory record store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::{record_id, RecordStore, StoreError, StoreResult};
use crate::cache::{CacheRecord, RecordId};

// == Documents ==
/// Id-ordered record collection shared by the store implementations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct Documents {
    next_id: RecordId,
    records: BTreeMap<RecordId, CacheRecord>,
}

impl Documents {
    pub(super) fn upsert(&mut self, mut record: CacheRecord) -> StoreResult<CacheRecord> {
        let id = match record.id {
            Some(id) if self.records.contains_key(&id) => id,
            Some(id) => return Err(StoreError::Missing(id)),
            None => {
                self.next_id += 1;
                self.next_id
            }
        };
        record.id = Some(id);
        self.records.insert(id, record.clone());
        Ok(record)
    }

    pub(super) fn find(&self, storage_key: &str) -> Option<CacheRecord> {
        self.records
            .values()
            .find(|record| record.storage_key == storage_key)
            .cloned()
    }

    pub(super) fn remove(&mut self, record: &CacheRecord) -> StoreResult<()> {
        let id = record_id(record)?;
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::Missing(id))
    }

    pub(super) fn first(&self, limit: usize) -> Vec<CacheRecord> {
        self.records.values().take(limit).cloned().collect()
    }

    /// Removes every listed record, returning how many were present.
    pub(super) fn remove_all(&mut self, records: &[CacheRecord]) -> StoreResult<usize> {
        let ids = records.iter().map(record_id).collect::<StoreResult<Vec<_>>>()?;
        Ok(ids
            .into_iter()
            .filter(|id| self.records.remove(id).is_some())
            .count())
    }

    pub(super) fn len(&self) -> usize {
        self.records.len()
    }
}

// == Memory Store ==
/// Record store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Documents>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records, expired ones included.
    pub fn len(&self) -> usize {
        self.documents().len()
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn documents(&self) -> MutexGuard<'_, Documents> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordStore for MemoryStore {
    fn create_or_update(&self, record: CacheRecord) -> StoreResult<CacheRecord> {
        self.documents().upsert(record)
    }

    fn find_by_key(&self, storage_key: &str) -> StoreResult<Option<CacheRecord>> {
        Ok(self.documents().find(storage_key))
    }

    fn delete_one(&self, record: &CacheRecord) -> StoreResult<()> {
        self.documents().remove(record)
    }

    fn fetch_up_to(&self, limit: usize) -> StoreResult<Vec<CacheRecord>> {
        Ok(self.documents().first(limit))
    }

    fn delete_many(&self, records: &[CacheRecord]) -> StoreResult<()> {
        self.documents().remove_all(records).map(|_| ())
    }
}

//! Record Store Module
//!
//! The document store the cache facade persists its records in.

mod file;
mod memory;

use std::sync::Arc;

use thiserror::Error;

use crate::cache::{CacheRecord, RecordId};

pub use file::FileStore;
pub use memory::MemoryStore;

// == Store Error ==
/// Failures reported by a record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Record to update or delete no longer exists
    #[error("Record {0} no longer exists")]
    Missing(RecordId),

    /// Record was never persisted and has no id
    #[error("Record for '{0}' has not been persisted")]
    Unsaved(String),

    /// Backing file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file holds malformed documents
    #[error("Malformed document: {0}")]
    Format(#[from] serde_json::Error),

    /// Store refused or failed the call
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for record store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Record Store Trait ==
/// A document store with query-by-key and bulk deletion.
///
/// Each call is atomic on its own. Nothing is isolated across calls.
pub trait RecordStore: Send + Sync {
    /// Inserts a record without an id or overwrites the record with its id.
    ///
    /// Returns the record as persisted, with its id assigned.
    fn create_or_update(&self, record: CacheRecord) -> StoreResult<CacheRecord>;

    /// Returns the first record stored under `storage_key`.
    fn find_by_key(&self, storage_key: &str) -> StoreResult<Option<CacheRecord>>;

    /// Deletes a single persisted record.
    fn delete_one(&self, record: &CacheRecord) -> StoreResult<()>;

    /// Returns up to `limit` records in store order.
    fn fetch_up_to(&self, limit: usize) -> StoreResult<Vec<CacheRecord>>;

    /// Deletes every given record. Records already gone are skipped.
    fn delete_many(&self, records: &[CacheRecord]) -> StoreResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn create_or_update(&self, record: CacheRecord) -> StoreResult<CacheRecord> {
        (**self).create_or_update(record)
    }

    fn find_by_key(&self, storage_key: &str) -> StoreResult<Option<CacheRecord>> {
        (**self).find_by_key(storage_key)
    }

    fn delete_one(&self, record: &CacheRecord) -> StoreResult<()> {
        (**self).delete_one(record)
    }

    fn fetch_up_to(&self, limit: usize) -> StoreResult<Vec<CacheRecord>> {
        (**self).fetch_up_to(limit)
    }

    fn delete_many(&self, records: &[CacheRecord]) -> StoreResult<()> {
        (**self).delete_many(records)
    }
}

fn record_id(record: &CacheRecord) -> StoreResult<RecordId> {
    record
        .id
        .ok_or_else(|| StoreError::Unsaved(record.storage_key.clone()))
}

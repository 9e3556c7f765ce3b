//! Cache Facade Module
//!
//! The memcache-style API. Every read goes through a single lookup that hides
//! and lazily deletes expired records. Store failures are logged and reported
//! as `false` or [`DeleteOutcome::NetworkFailure`], never as errors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::cache::guard::{Unguarded, WriteCoordinator};
use crate::cache::key::{storage_key, CacheKey};
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::cache::time::{parse_time, Ttl};
use crate::cache::{CacheRecord, Codec, JsonCodec, MAX_FLUSH_ITEMS};
use crate::error::{CacheError, Result};
use crate::store::{RecordStore, StoreError, StoreResult};

// == Delete Outcome ==
/// Result of [`DatastoreCache::delete`], numbered like memcache's constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeleteOutcome {
    /// The store failed while deleting
    NetworkFailure = 0,
    /// No valid entry existed for the key
    ItemMissing = 1,
    /// The entry was deleted
    Successful = 2,
}

impl DeleteOutcome {
    /// Returns the numeric memcache code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns the memcache constant name.
    pub fn as_str(self) -> &'static str {
        match self {
            DeleteOutcome::NetworkFailure => "NETWORK_FAILURE",
            DeleteOutcome::ItemMissing => "ITEM_MISSING",
            DeleteOutcome::Successful => "SUCCESSFUL",
        }
    }
}

// == Datastore Cache ==
/// Cache facade persisting entries in a [`RecordStore`].
pub struct DatastoreCache<C: Codec = JsonCodec> {
    /// Backing document store
    store: Arc<dyn RecordStore>,
    /// Value serializer
    codec: C,
    /// Isolation for read-modify-write sequences
    coordinator: Box<dyn WriteCoordinator>,
    /// Lookup counters
    stats: StatsRecorder,
}

impl DatastoreCache<JsonCodec> {
    // == Constructor ==
    /// Creates a facade storing JSON-encoded values without write coordination.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_codec(store, JsonCodec)
    }
}

impl<C: Codec> DatastoreCache<C> {
    /// Creates a facade with a custom value codec.
    pub fn with_codec(store: Arc<dyn RecordStore>, codec: C) -> Self {
        Self {
            store,
            codec,
            coordinator: Box::new(Unguarded),
            stats: StatsRecorder::default(),
        }
    }

    /// Replaces the write coordination strategy.
    pub fn with_coordinator(mut self, coordinator: impl WriteCoordinator + 'static) -> Self {
        self.coordinator = Box::new(coordinator);
        self
    }

    // == Set ==
    /// Sets a key's value, regardless of previous contents.
    ///
    /// Returns `Ok(true)` if stored and `Ok(false)` if the store (or the
    /// value's serialization) failed. Errors are reserved for malformed keys
    /// and time values.
    pub fn set<T: Serialize + ?Sized>(
        &self,
        key: impl Into<CacheKey>,
        value: &T,
        ttl: impl Into<Ttl>,
        namespace: Option<&str>,
    ) -> Result<bool> {
        let storage_key = storage_key(&key.into(), namespace)?;
        let expires_at = parse_time(ttl.into(), Utc::now())?;

        let _lease = self.coordinator.acquire(&storage_key);
        Ok(self.write(storage_key, value, expires_at))
    }

    // == Get ==
    /// Returns the value of the key, or `None` on a miss.
    ///
    /// An expired entry counts as a miss and is deleted unless
    /// `delete_expired` is false.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: impl Into<CacheKey>,
        namespace: Option<&str>,
        delete_expired: bool,
    ) -> Result<Option<T>> {
        let storage_key = storage_key(&key.into(), namespace)?;

        let record = match self.lookup(&storage_key, delete_expired) {
            Ok(record) => record,
            Err(e) => {
                self.store_failed("lookup", &storage_key, &e);
                None
            }
        };

        match record {
            Some(record) => {
                self.stats.record_hit();
                self.codec.decode(&record.payload).map(Some)
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Delete ==
    /// Deletes a key.
    ///
    /// `_seconds` is accepted for memcache compatibility and ignored.
    pub fn delete(
        &self,
        key: impl Into<CacheKey>,
        _seconds: u64,
        namespace: Option<&str>,
    ) -> Result<DeleteOutcome> {
        let storage_key = storage_key(&key.into(), namespace)?;
        let _lease = self.coordinator.acquire(&storage_key);

        let record = match self.lookup(&storage_key, true) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(DeleteOutcome::ItemMissing),
            Err(e) => {
                self.store_failed("lookup", &storage_key, &e);
                return Ok(DeleteOutcome::NetworkFailure);
            }
        };

        match self.store.delete_one(&record) {
            Ok(()) => {
                debug!(storage_key = %storage_key, "Deleted cache entry");
                Ok(DeleteOutcome::Successful)
            }
            Err(e) => {
                self.store_failed("delete", &storage_key, &e);
                Ok(DeleteOutcome::NetworkFailure)
            }
        }
    }

    // == Add ==
    /// Sets a key's value only if no valid entry exists yet.
    pub fn add<T: Serialize + ?Sized>(
        &self,
        key: impl Into<CacheKey>,
        value: &T,
        ttl: impl Into<Ttl>,
        namespace: Option<&str>,
    ) -> Result<bool> {
        self.write_if(key.into(), value, ttl.into(), namespace, false)
    }

    // == Replace ==
    /// Sets a key's value only if a valid entry already exists.
    pub fn replace<T: Serialize + ?Sized>(
        &self,
        key: impl Into<CacheKey>,
        value: &T,
        ttl: impl Into<Ttl>,
        namespace: Option<&str>,
    ) -> Result<bool> {
        self.write_if(key.into(), value, ttl.into(), namespace, true)
    }

    // == Flush All ==
    /// Deletes up to `max_items` records across all namespaces.
    ///
    /// Returns `Ok(false)` if the store failed or if records remain afterwards.
    /// `max_items` must lie in `1..=MAX_FLUSH_ITEMS`.
    pub fn flush_all(&self, max_items: usize) -> Result<bool> {
        if !(1..=MAX_FLUSH_ITEMS).contains(&max_items) {
            return Err(CacheError::InvalidArgument(format!(
                "max_items must be between 1 and {}, got {}",
                MAX_FLUSH_ITEMS, max_items
            )));
        }

        let batch = match self.store.fetch_up_to(max_items) {
            Ok(batch) => batch,
            Err(e) => {
                self.store_failed("fetch", "*", &e);
                return Ok(false);
            }
        };

        if let Err(e) = self.store.delete_many(&batch) {
            self.store_failed("bulk delete", "*", &e);
            return Ok(false);
        }
        info!("Flushed {} cache records", batch.len());

        match self.store.fetch_up_to(1) {
            Ok(rest) if rest.is_empty() => Ok(true),
            Ok(_) => {
                info!("Flush left records behind (limit {})", max_items);
                Ok(false)
            }
            Err(e) => {
                self.store_failed("fetch", "*", &e);
                Ok(false)
            }
        }
    }

    // == Stats ==
    /// Returns current lookup statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Runs `set` only if the presence of a valid entry matches `must_exist`.
    fn write_if<T: Serialize + ?Sized>(
        &self,
        key: CacheKey,
        value: &T,
        ttl: Ttl,
        namespace: Option<&str>,
        must_exist: bool,
    ) -> Result<bool> {
        let storage_key = storage_key(&key, namespace)?;
        let expires_at = parse_time(ttl, Utc::now())?;
        let _lease = self.coordinator.acquire(&storage_key);

        match self.lookup(&storage_key, true) {
            Ok(found) if found.is_some() == must_exist => {
                Ok(self.write(storage_key, value, expires_at))
            }
            Ok(_) => Ok(false),
            Err(e) => {
                self.store_failed("lookup", &storage_key, &e);
                Ok(false)
            }
        }
    }

    /// Overwrites the valid record for `storage_key` or creates a new one.
    fn write<T: Serialize + ?Sized>(
        &self,
        storage_key: String,
        value: &T,
        expires_at: DateTime<Utc>,
    ) -> bool {
        let existing = match self.lookup(&storage_key, true) {
            Ok(existing) => existing,
            Err(e) => {
                self.store_failed("lookup", &storage_key, &e);
                return false;
            }
        };

        let payload = match self.codec.encode(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(storage_key = %storage_key, error = %e, "Failed to encode cache value");
                return false;
            }
        };

        let record = match existing {
            Some(mut record) => {
                record.payload = payload;
                record.expires_at = expires_at;
                record
            }
            None => CacheRecord::new(storage_key.clone(), payload, expires_at),
        };

        match self.store.create_or_update(record) {
            Ok(saved) => {
                debug!(
                    storage_key = %storage_key,
                    id = ?saved.id,
                    expires_at = %saved.expires_at,
                    "Stored cache entry"
                );
                true
            }
            Err(e) => {
                self.store_failed("write", &storage_key, &e);
                false
            }
        }
    }

    /// Returns the valid record stored under `storage_key`.
    ///
    /// Expired records are reported as absent and, if `delete_expired` is
    /// set, removed from the store.
    fn lookup(&self, storage_key: &str, delete_expired: bool) -> StoreResult<Option<CacheRecord>> {
        let Some(record) = self.store.find_by_key(storage_key)? else {
            return Ok(None);
        };

        if !record.is_expired() {
            return Ok(Some(record));
        }

        if delete_expired {
            match self.store.delete_one(&record) {
                Ok(()) => {
                    self.stats.record_expired_deletion();
                    debug!(storage_key, "Deleted expired cache entry");
                }
                Err(e) => self.store_failed("expired delete", storage_key, &e),
            }
        }
        Ok(None)
    }

    fn store_failed(&self, operation: &str, storage_key: &str, error: &StoreError) {
        self.stats.record_store_failure();
        warn!(operation, storage_key, error = %error, "Record store call failed");
    }
}

//! Cache Record Module
//!
//! Defines the document persisted in the record store for each cache entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a record by its store.
pub type RecordId = u64;

// == Cache Record ==
/// A persisted cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Store-assigned identifier, `None` until first persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Namespaced, possibly hashed key the record is looked up by
    pub storage_key: String,
    /// Serialized value
    pub payload: Vec<u8>,
    /// Absolute expiration time
    pub expires_at: DateTime<Utc>,
}

impl CacheRecord {
    // == Constructor ==
    /// Creates a record that has not been persisted yet.
    pub fn new(storage_key: String, payload: Vec<u8>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            storage_key,
            payload,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks whether the record is expired at `now`.
    ///
    /// A record stays valid up to and including its expiration instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Checks whether the record is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

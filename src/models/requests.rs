//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::cache::{CacheKey, Ttl, MAX_FLUSH_ITEMS};
use crate::error::{CacheError, Result};

/// Request body for SET, ADD and REPLACE
///
/// # Fields
/// - `key`: a string, or an array whose second item is the key
/// - `value`: any JSON value
/// - `ttl`: memcache time value, 0 (never expire) when omitted
/// - `namespace`: optional key prefix
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRequest {
    /// The cache key
    pub key: Value,
    /// The value to store
    pub value: Value,
    /// Time value in seconds
    #[serde(default = "default_ttl")]
    pub ttl: Value,
    /// Optional namespace
    #[serde(default)]
    pub namespace: Option<String>,
}

impl StoreRequest {
    /// Parses the JSON key into a cache key.
    pub fn cache_key(&self) -> Result<CacheKey> {
        CacheKey::try_from(self.key.clone())
    }

    /// Parses the JSON time value.
    pub fn ttl(&self) -> Result<Ttl> {
        Ttl::try_from(&self.ttl)
    }
}

fn default_ttl() -> Value {
    json!(0)
}

/// Query string for GET /get/:key
#[derive(Debug, Clone, Deserialize)]
pub struct GetQuery {
    /// Optional namespace
    #[serde(default)]
    pub namespace: Option<String>,
    /// Delete the entry if it turns out to be expired
    #[serde(default = "default_delete_expired")]
    pub delete_expired: bool,
}

fn default_delete_expired() -> bool {
    true
}

/// Query string for DELETE /del/:key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteQuery {
    /// Optional namespace
    #[serde(default)]
    pub namespace: Option<String>,
    /// Accepted for compatibility, ignored
    #[serde(default)]
    pub seconds: u64,
}

/// Request body for POST /flush
#[derive(Debug, Clone, Deserialize)]
pub struct FlushRequest {
    /// Maximum number of records to delete
    #[serde(default = "default_max_items")]
    pub max_items: i64,
}

impl Default for FlushRequest {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
        }
    }
}

impl FlushRequest {
    /// Parses an optional JSON body. An empty body means the default limit.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| CacheError::InvalidArgument(format!("invalid flush request: {}", e)))
    }

    /// Returns the limit as a record count, saturating at the `usize` bounds.
    ///
    /// The facade rejects anything outside its accepted range.
    pub fn limit(&self) -> usize {
        usize::try_from(self.max_items.max(0)).unwrap_or(usize::MAX)
    }
}

fn default_max_items() -> i64 {
    MAX_FLUSH_ITEMS as i64
}

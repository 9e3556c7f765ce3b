//! Cache Key Module
//!
//! Resolves caller-supplied keys into the storage keys used by the record store.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::cache::MAX_STORAGE_KEY_LENGTH;
use crate::error::{CacheError, Result};

// == Cache Key ==
/// A logical cache key as supplied by the caller.
///
/// Memcache clients may pass either a plain string or a `(hash, key)` tuple.
/// Only the second item of a composite key is used; everything else is ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheKey {
    /// A plain string key
    Plain(String),
    /// An ordered sequence whose second item is the key
    Composite(Vec<Value>),
}

impl CacheKey {
    /// Returns the string this key resolves to.
    ///
    /// Fails with `InvalidKeyType` when a composite key has fewer than two
    /// items or its second item is not a string.
    pub fn resolve(&self) -> Result<&str> {
        match self {
            CacheKey::Plain(key) => Ok(key),
            CacheKey::Composite(parts) => match parts.get(1) {
                Some(Value::String(key)) => Ok(key),
                _ => Err(CacheError::InvalidKeyType),
            },
        }
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey::Plain(key.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        CacheKey::Plain(key)
    }
}

impl From<&String> for CacheKey {
    fn from(key: &String) -> Self {
        CacheKey::Plain(key.clone())
    }
}

impl<H: Into<Value>> From<(H, &str)> for CacheKey {
    fn from((hash, key): (H, &str)) -> Self {
        CacheKey::Composite(vec![hash.into(), Value::String(key.to_string())])
    }
}

impl TryFrom<Value> for CacheKey {
    type Error = CacheError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(key) => Ok(CacheKey::Plain(key)),
            Value::Array(parts) => {
                let key = CacheKey::Composite(parts);
                key.resolve()?;
                Ok(key)
            }
            _ => Err(CacheError::InvalidKeyType),
        }
    }
}

// == Storage Key ==
/// Builds the storage key for a logical key within an optional namespace.
///
/// The key is `namespace + key` while that stays within
/// [`MAX_STORAGE_KEY_LENGTH`] characters. Longer keys are replaced by the hex
/// SHA-256 of the raw key, still prefixed by the namespace.
pub fn storage_key(key: &CacheKey, namespace: Option<&str>) -> Result<String> {
    let key = key.resolve()?;
    let namespace = namespace.unwrap_or_default();

    let joined_len = namespace.chars().count() + key.chars().count();
    if joined_len <= MAX_STORAGE_KEY_LENGTH {
        return Ok(format!("{namespace}{key}"));
    }

    Ok(format!("{namespace}{}", sha256_hex(key)))
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

//! Value Codec Module
//!
//! Serializes cached values into the opaque payload stored with each record.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CacheError, Result};

// == Codec Trait ==
/// Converts values to and from stored payload bytes.
pub trait Codec: Send + Sync {
    /// Serializes a value into payload bytes.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserializes a payload back into a value.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

// == JSON Codec ==
/// Default codec storing values as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}

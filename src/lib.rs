//! Datastore Cache - a memcache-style cache on persistent storage
//!
//! Provides set/get/delete/add/replace/flush over a document store, with key
//! normalization and lazy expiration.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;

pub use api::AppState;
pub use cache::{CacheKey, DatastoreCache, DeleteOutcome, Ttl};
pub use config::Config;
pub use error::{CacheError, Result};

//! Cache Module
//!
//! Memcache-style cache facade over a persistent record store, with key
//! normalization and lazy expiration.

mod codec;
mod facade;
mod guard;
mod key;
mod record;
mod stats;
mod time;


// Re-export public types
pub use codec::{Codec, JsonCodec};
pub use facade::{DatastoreCache, DeleteOutcome};
pub use guard::{KeyedLocks, Lease, Unguarded, WriteCoordinator};
pub use key::{storage_key, CacheKey};
pub use record::{CacheRecord, RecordId};
pub use stats::CacheStats;
pub use time::{never_expires, parse_time, Ttl};

// == Public Constants ==
/// Longest `namespace + key` stored verbatim; longer keys are hashed
pub const MAX_STORAGE_KEY_LENGTH: usize = 250;

/// Largest time value read as a relative offset (31 days in seconds)
pub const MAX_RELATIVE_TTL_SECS: u32 = 2_678_400;

/// Upper bound and default for the number of records one flush deletes
pub const MAX_FLUSH_ITEMS: usize = 1000;

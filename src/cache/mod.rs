//! Cache Module
//!
//! Cache handle with expiration resolution, serialized updates and removal
//! notification over an abstract entry store.

mod entry;
mod expiration;
mod handle;
mod lru;
mod removal;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, EntryKey};
pub use expiration::{resolve, ExpirationMode, HandleConfiguration};
pub use handle::{CacheHandle, UpdateOutcome};
pub use lru::LruTracker;
pub use removal::{RemovalEvent, RemovalHandler, RemovalNotifier, RemovalReason};
pub use stats::CacheStats;
pub use store::{AddOutcome, EntryStore, MemoryStore};

// == Public Constants ==
/// Maximum allowed key length in bytes at the HTTP surface
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes at the HTTP surface
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

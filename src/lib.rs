//! Handle Cache - A cache handle with expiration policy and serialized updates
//!
//! Resolves per-entry against per-handle expiration, applies read-modify-write
//! updates one at a time per handle, and notifies observers of entries that
//! leave the store. Ships with an in-memory store and an HTTP surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheEntry, CacheHandle, ExpirationMode, HandleConfiguration, UpdateOutcome};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;

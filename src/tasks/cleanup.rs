//! Expiry Cleanup Task
//!
//! Background task that periodically purges expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheHandle, EntryStore};

/// Spawns a background task that periodically purges expired entries.
///
/// Each purged entry is announced to the handle's removal observers with
/// reason `Expired`.
///
/// # Arguments
/// * `cache` - Shared cache handle
/// * `cleanup_interval_secs` - Interval in seconds between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheHandle::in_memory(HandleConfiguration::default(), 1000));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<V, S>(
    cache: Arc<CacheHandle<V, S>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
    S: EntryStore<V> + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry cleanup for '{}' with interval of {} seconds",
            cache.name(),
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.remove_expired();

            if removed > 0 {
                info!("Expiry cleanup: removed {} expired entries", removed);
            } else {
                debug!("Expiry cleanup: no expired entries found");
            }
        }
    })
}

//! Cache Handle Module
//!
//! A cache handle layers expiration resolution, serialized read-modify-write
//! updates and removal notification on top of an [`EntryStore`].

use std::marker::PhantomData;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use crate::cache::{
    resolve, AddOutcome, CacheEntry, CacheStats, EntryKey, EntryStore, ExpirationMode,
    HandleConfiguration, MemoryStore, RemovalEvent, RemovalNotifier, RemovalReason,
};
use crate::error::{CacheError, Result};

// == Update Outcome ==
/// Result of [`CacheHandle::update`]. Absence and rejection are outcomes,
/// never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome<V> {
    /// The transformed entry that was written
    Success(CacheEntry<V>),
    /// No live entry under the key; the transform was not called
    ItemDidNotExist,
    /// The transform returned `None`; nothing was written
    FactoryReturnedNull,
    /// Concurrent writers won every attempt
    TooManyRetries,
}

impl<V> UpdateOutcome<V> {
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Success(_))
    }

    pub fn into_entry(self) -> Option<CacheEntry<V>> {
        match self {
            UpdateOutcome::Success(entry) => Some(entry),
            _ => None,
        }
    }
}

// == Cache Handle ==
/// One cache handle over a single entry store.
///
/// The handle is `Send + Sync`; share it with `Arc`.
pub struct CacheHandle<V, S = MemoryStore<V>> {
    config: HandleConfiguration,
    store: S,
    /// Serializes the read-modify-write window of `update`
    update_lock: Mutex<()>,
    notifier: RemovalNotifier,
    stats: Mutex<CacheStats>,
    _value: PhantomData<fn() -> V>,
}

impl<V> CacheHandle<V, MemoryStore<V>>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a handle over an in-memory store holding `max_entries`.
    pub fn in_memory(config: HandleConfiguration, max_entries: usize) -> Self {
        Self::new(config, MemoryStore::new(max_entries))
    }
}

impl<V, S> CacheHandle<V, S>
where
    V: Clone + Send + Sync + 'static,
    S: EntryStore<V>,
{
    // == Constructor ==
    pub fn new(config: HandleConfiguration, store: S) -> Self {
        Self {
            config,
            store,
            update_lock: Mutex::new(()),
            notifier: RemovalNotifier::new(),
            stats: Mutex::new(CacheStats::new()),
            _value: PhantomData,
        }
    }

    // == Metadata ==
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn configuration(&self) -> &HandleConfiguration {
        &self.config
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn count(&self) -> usize {
        self.store.count()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot of the handle counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.set_total_entries(self.store.count());
        stats
    }

    // == Get ==
    /// Returns the live entry under `key`.
    ///
    /// Expired entries are removed and notified. Reading a sliding entry
    /// restarts its window.
    pub fn get(&self, key: &str) -> Result<Option<CacheEntry<V>>> {
        self.get_entry(key_of(key, None)?)
    }

    pub fn get_in_region(&self, key: &str, region: &str) -> Result<Option<CacheEntry<V>>> {
        self.get_entry(key_of(key, Some(region))?)
    }

    fn get_entry(&self, key: EntryKey) -> Result<Option<CacheEntry<V>>> {
        let now = Utc::now();
        let found = match self.read(&key, now) {
            Some(entry) if entry.expiration_mode() == ExpirationMode::Sliding => {
                // A concurrent remove may win, the read still counts as a hit
                Some(self.store.touch(&key, now).unwrap_or(entry))
            }
            other => other,
        };

        self.record(|stats| match found {
            Some(_) => stats.record_hit(),
            None => stats.record_miss(),
        });
        Ok(found)
    }

    // == Put ==
    /// Resolves the entry's expiration and stores it unconditionally.
    pub fn put(&self, entry: CacheEntry<V>) -> Result<CacheEntry<V>> {
        validate_entry(&entry)?;
        let stored = self.write(entry)?;
        self.record(|stats| stats.record_put());
        Ok(stored)
    }

    // == Add ==
    /// Stores the entry only if its key holds no live entry.
    ///
    /// Returns true iff the entry was added.
    pub fn add(&self, entry: CacheEntry<V>) -> Result<bool> {
        validate_entry(&entry)?;
        let resolved = resolve(entry, &self.config)?;
        let key = resolved.entry_key();

        if let Some(expired) = self.store.remove_if_expired(&key, Utc::now()) {
            self.removed_by_expiry(vec![expired]);
        }

        match self.store.add(resolved) {
            AddOutcome::Added { evicted } => {
                self.record(|stats| stats.record_add());
                self.removed_by_eviction(evicted);
                Ok(true)
            }
            AddOutcome::AlreadyExists => Ok(false),
        }
    }

    // == Remove ==
    /// Removes the entry under `key`. Returns true iff one was stored.
    pub fn remove(&self, key: &str) -> Result<bool> {
        self.remove_entry(key_of(key, None)?)
    }

    pub fn remove_in_region(&self, key: &str, region: &str) -> Result<bool> {
        self.remove_entry(key_of(key, Some(region))?)
    }

    fn remove_entry(&self, key: EntryKey) -> Result<bool> {
        let removed = self.store.remove(&key).is_some();
        if removed {
            self.record(|stats| stats.record_remove());
        }
        Ok(removed)
    }

    pub fn clear(&self) {
        self.store.clear();
        debug!("Cache handle '{}' cleared", self.config.name);
    }

    // == Update ==
    /// Applies `transform` to the current value under `key` and writes the
    /// result back.
    ///
    /// Updates on one handle are serialized. `max_retries` is honoured by
    /// layered managers that re-invoke `update` on version conflicts; the
    /// in-process protocol makes exactly one attempt.
    ///
    /// # Errors
    /// Only for an empty key or an invalid expiration configuration. A
    /// missing key or a `None` from `transform` are reported as outcomes.
    pub fn update<F>(&self, key: &str, transform: F, max_retries: u32) -> Result<UpdateOutcome<V>>
    where
        F: FnMut(&V) -> Option<V>,
    {
        self.update_entry(key_of(key, None)?, transform, max_retries)
    }

    pub fn update_in_region<F>(
        &self,
        key: &str,
        region: &str,
        transform: F,
        max_retries: u32,
    ) -> Result<UpdateOutcome<V>>
    where
        F: FnMut(&V) -> Option<V>,
    {
        self.update_entry(key_of(key, Some(region))?, transform, max_retries)
    }

    fn update_entry<F>(
        &self,
        key: EntryKey,
        mut transform: F,
        max_retries: u32,
    ) -> Result<UpdateOutcome<V>>
    where
        F: FnMut(&V) -> Option<V>,
    {
        // Observers run after the guard is dropped
        let guard = self.update_lock.lock();

        let (current, expired) = self.lookup(&key, Utc::now());
        let Some(current) = current else {
            drop(guard);
            self.removed_by_expiry(expired);
            debug!("Update of '{}' skipped: item did not exist", key);
            return Ok(UpdateOutcome::ItemDidNotExist);
        };

        let Some(new_value) = transform(current.value()) else {
            debug!("Update of '{}' skipped: transform returned no value", key);
            return Ok(UpdateOutcome::FactoryReturnedNull);
        };

        let updated = current.with_value(new_value).touched(Utc::now());
        let (stored, evicted) = self.store_resolved(updated)?;
        drop(guard);

        self.removed_by_eviction(evicted);
        self.record(|stats| stats.record_update());

        debug!(
            "Updated '{}' in one attempt (retry budget {})",
            key, max_retries
        );
        Ok(UpdateOutcome::Success(stored))
    }

    // == Expire ==
    /// Changes the expiration of the entry under `key`.
    ///
    /// `mode` selects the transition: absolute or sliding with `timeout`,
    /// no expiration, or back to the handle defaults. A missing key is a
    /// no-op.
    ///
    /// # Errors
    /// A timed mode with a zero timeout is a configuration error.
    pub fn expire(&self, key: &str, mode: ExpirationMode, timeout: Duration) -> Result<()> {
        self.expire_entry(key_of(key, None)?, mode, timeout)
    }

    pub fn expire_in_region(
        &self,
        key: &str,
        region: &str,
        mode: ExpirationMode,
        timeout: Duration,
    ) -> Result<()> {
        self.expire_entry(key_of(key, Some(region))?, mode, timeout)
    }

    fn expire_entry(&self, key: EntryKey, mode: ExpirationMode, timeout: Duration) -> Result<()> {
        let Some(current) = self.read(&key, Utc::now()) else {
            debug!("Expire of '{}' skipped: item not found", key);
            return Ok(());
        };

        let stored = self.write(current.with_expiration(mode, timeout))?;
        debug!(
            "Expiration of '{}' set to {} ({:?})",
            key,
            stored.expiration_mode(),
            stored.expiration_timeout()
        );
        Ok(())
    }

    // == Removal Notification ==
    /// Registers an observer of entries leaving the store.
    ///
    /// Observers run synchronously on the thread that detected the removal,
    /// never while an update holds the handle's lock.
    pub fn on_removed<F>(&self, handler: F)
    where
        F: Fn(&RemovalEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.notifier.register(handler);
    }

    /// Opens a channel receiving every later removal event.
    pub fn subscribe(&self) -> broadcast::Receiver<RemovalEvent> {
        self.notifier.subscribe()
    }

    /// Signals that an entry left the store for `reason`.
    pub fn notify_removed(
        &self,
        key: &str,
        region: Option<&str>,
        reason: RemovalReason,
    ) -> Result<()> {
        let key = key_of(key, region)?;
        self.notifier.dispatch(RemovalEvent::new(key, reason));
        Ok(())
    }

    // == Remove Expired ==
    /// Purges every expired entry and notifies each one.
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&self) -> usize {
        let expired = self.store.remove_expired(Utc::now());
        let count = expired.len();
        self.removed_by_expiry(expired);
        count
    }

    // == Internals ==
    /// Reads the live entry under `key`, purging it if it has expired.
    fn read(&self, key: &EntryKey, now: DateTime<Utc>) -> Option<CacheEntry<V>> {
        let (live, expired) = self.lookup(key, now);
        self.removed_by_expiry(expired);
        live
    }

    /// Like `read`, but hands expired entries back instead of notifying.
    fn lookup(
        &self,
        key: &EntryKey,
        now: DateTime<Utc>,
    ) -> (Option<CacheEntry<V>>, Vec<CacheEntry<V>>) {
        match self.store.get(key) {
            Some(entry) if !entry.is_expired_at(now) => (Some(entry), Vec::new()),
            Some(_) => (None, self.store.remove_if_expired(key, now).into_iter().collect()),
            None => (None, Vec::new()),
        }
    }

    /// Resolves expiration and writes through the store.
    fn write(&self, entry: CacheEntry<V>) -> Result<CacheEntry<V>> {
        let (stored, evicted) = self.store_resolved(entry)?;
        self.removed_by_eviction(evicted);
        Ok(stored)
    }

    /// Like `write`, but hands evicted entries back instead of notifying.
    fn store_resolved(
        &self,
        entry: CacheEntry<V>,
    ) -> Result<(CacheEntry<V>, Vec<CacheEntry<V>>)> {
        let resolved = resolve(entry, &self.config)?;
        let evicted = self.store.put(resolved.clone());
        Ok((resolved, evicted))
    }

    fn removed_by_expiry(&self, entries: Vec<CacheEntry<V>>) {
        if entries.is_empty() {
            return;
        }
        self.record(|stats| stats.record_expirations(entries.len()));
        for entry in entries {
            self.notifier
                .dispatch(RemovalEvent::new(entry.entry_key(), RemovalReason::Expired));
        }
    }

    fn removed_by_eviction(&self, entries: Vec<CacheEntry<V>>) {
        if entries.is_empty() {
            return;
        }
        self.record(|stats| stats.record_evictions(entries.len()));
        for entry in entries {
            debug!("Evicted '{}' from '{}'", entry.entry_key(), self.config.name);
            self.notifier
                .dispatch(RemovalEvent::new(entry.entry_key(), RemovalReason::Evicted));
        }
    }

    fn record(&self, f: impl FnOnce(&mut CacheStats)) {
        if self.config.enable_statistics {
            f(&mut *self.stats.lock());
        }
    }
}

impl<V, S> std::fmt::Debug for CacheHandle<V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheHandle")
            .field("config", &self.config)
            .field("notifier", &self.notifier)
            .finish()
    }
}

// == Validation ==
fn key_of(key: &str, region: Option<&str>) -> Result<EntryKey> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    match region {
        Some("") => Err(CacheError::InvalidRequest(
            "Region cannot be empty".to_string(),
        )),
        Some(region) => Ok(EntryKey::in_region(key, region)),
        None => Ok(EntryKey::new(key)),
    }
}

fn validate_entry<V>(entry: &CacheEntry<V>) -> Result<()> {
    key_of(entry.key(), entry.region()).map(|_| ())
}

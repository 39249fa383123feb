//! Cache Entry Module
//!
//! Defines the immutable cache entry and the key it is stored under.
//! Every transition returns a new entry, nothing is mutated in place.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::ExpirationMode;

// == Entry Key ==
/// Store key: the entry key qualified by an optional region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub key: String,
    pub region: Option<String>,
}

impl EntryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            region: None,
        }
    }

    pub fn in_region(key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            region: Some(region.into()),
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}:{}", region, self.key),
            None => f.write_str(&self.key),
        }
    }
}

// == Cache Entry ==
/// A single cached value with its expiration metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    key: String,
    region: Option<String>,
    value: V,
    expiration_mode: ExpirationMode,
    expiration_timeout: Duration,
    uses_handle_default_expiration: bool,
    created_utc: DateTime<Utc>,
    last_accessed_utc: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    // == Constructors ==
    /// Creates an entry that defers its expiration to the handle.
    pub fn new(key: impl Into<String>, value: V) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            region: None,
            value,
            expiration_mode: ExpirationMode::Default,
            expiration_timeout: Duration::ZERO,
            uses_handle_default_expiration: true,
            created_utc: now,
            last_accessed_utc: now,
        }
    }

    /// Creates a region-qualified entry that defers its expiration to the handle.
    pub fn in_region(key: impl Into<String>, region: impl Into<String>, value: V) -> Self {
        let mut entry = Self::new(key, value);
        entry.region = Some(region.into());
        entry
    }

    // == Accessors ==
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn expiration_mode(&self) -> ExpirationMode {
        self.expiration_mode
    }

    pub fn expiration_timeout(&self) -> Duration {
        self.expiration_timeout
    }

    /// True when the effective expiration came from the handle configuration.
    pub fn uses_handle_default_expiration(&self) -> bool {
        self.uses_handle_default_expiration
    }

    pub fn created_utc(&self) -> DateTime<Utc> {
        self.created_utc
    }

    pub fn last_accessed_utc(&self) -> DateTime<Utc> {
        self.last_accessed_utc
    }

    /// Returns the store key for this entry.
    pub fn entry_key(&self) -> EntryKey {
        EntryKey {
            key: self.key.clone(),
            region: self.region.clone(),
        }
    }

    // == Transitions ==
    /// Replaces the value, keeping key, region, expiration and timestamps.
    pub fn with_value(self, value: V) -> Self {
        Self { value, ..self }
    }

    /// Expires `timeout` after now. Restarts the absolute countdown.
    pub fn with_absolute_expiration(self, timeout: Duration) -> Self {
        Self {
            expiration_mode: ExpirationMode::Absolute,
            expiration_timeout: timeout,
            uses_handle_default_expiration: false,
            created_utc: Utc::now(),
            ..self
        }
    }

    /// Expires once `timeout` passes without an access. Counts now as an access.
    pub fn with_sliding_expiration(self, timeout: Duration) -> Self {
        Self {
            expiration_mode: ExpirationMode::Sliding,
            expiration_timeout: timeout,
            uses_handle_default_expiration: false,
            last_accessed_utc: Utc::now(),
            ..self
        }
    }

    /// Never expires, regardless of the handle configuration.
    pub fn with_no_expiration(self) -> Self {
        self.restarted(ExpirationMode::None, false)
    }

    /// Goes back to whatever the handle configuration says, with a fresh
    /// window for either timed mode.
    pub fn with_default_expiration(self) -> Self {
        self.restarted(ExpirationMode::Default, true)
    }

    fn restarted(self, mode: ExpirationMode, uses_handle_default: bool) -> Self {
        let now = Utc::now();
        Self {
            expiration_mode: mode,
            expiration_timeout: Duration::ZERO,
            uses_handle_default_expiration: uses_handle_default,
            created_utc: now,
            last_accessed_utc: now,
            ..self
        }
    }

    /// Applies the transition matching `mode`.
    ///
    /// `timeout` is ignored for [`ExpirationMode::None`] and
    /// [`ExpirationMode::Default`].
    pub fn with_expiration(self, mode: ExpirationMode, timeout: Duration) -> Self {
        match mode {
            ExpirationMode::Absolute => self.with_absolute_expiration(timeout),
            ExpirationMode::Sliding => self.with_sliding_expiration(timeout),
            ExpirationMode::None => self.with_no_expiration(),
            ExpirationMode::Default => self.with_default_expiration(),
        }
    }

    /// Stamps the last access time.
    pub fn touched(self, at: DateTime<Utc>) -> Self {
        Self {
            last_accessed_utc: at,
            ..self
        }
    }

    /// Stamps the outcome of expiration resolution.
    pub(crate) fn with_resolved_expiration(
        self,
        mode: ExpirationMode,
        timeout: Duration,
        uses_handle_default: bool,
    ) -> Self {
        Self {
            expiration_mode: mode,
            expiration_timeout: timeout,
            uses_handle_default_expiration: uses_handle_default,
            ..self
        }
    }

    // == Expiry ==
    /// Instant at which the entry expires, None if it never does.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let base = match self.expiration_mode {
            ExpirationMode::Absolute => self.created_utc,
            ExpirationMode::Sliding => self.last_accessed_utc,
            ExpirationMode::None | ExpirationMode::Default => return None,
        };
        let timeout = chrono::Duration::from_std(self.expiration_timeout).ok()?;
        base.checked_add_signed(timeout)
    }

    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: the entry is expired once `now` reaches the
    /// expiration instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Remaining lifetime at `now`.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry expires later
    /// - `None` if the entry never expires
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at()
            .map(|expires| (expires - now).to_std().unwrap_or(Duration::ZERO))
    }
}

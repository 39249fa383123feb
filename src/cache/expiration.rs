//! Expiration Module
//!
//! Expiration modes, per-handle configuration and the resolver that merges
//! an entry's own expiration request with the handle defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

// == Expiration Mode ==
/// How an entry expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpirationMode {
    /// Never expires
    None,
    /// Expires once `timeout` has passed since the last access
    Sliding,
    /// Expires once `timeout` has passed since the entry was stamped
    Absolute,
    /// Defer to the handle configuration
    #[default]
    Default,
}

impl ExpirationMode {
    /// True for the modes that need a positive timeout.
    pub fn is_timed(self) -> bool {
        matches!(self, ExpirationMode::Sliding | ExpirationMode::Absolute)
    }
}

impl fmt::Display for ExpirationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpirationMode::None => "none",
            ExpirationMode::Sliding => "sliding",
            ExpirationMode::Absolute => "absolute",
            ExpirationMode::Default => "default",
        };
        f.write_str(name)
    }
}

impl FromStr for ExpirationMode {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ExpirationMode::None),
            "sliding" => Ok(ExpirationMode::Sliding),
            "absolute" => Ok(ExpirationMode::Absolute),
            "default" => Ok(ExpirationMode::Default),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown expiration mode '{}'",
                other
            ))),
        }
    }
}

// == Handle Configuration ==
/// Immutable per-handle defaults, shared by every operation on the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleConfiguration {
    /// Handle name, used in logs
    pub name: String,
    /// Expiration applied to entries that don't ask for their own
    pub expiration_mode: ExpirationMode,
    /// Timeout paired with `expiration_mode`
    pub expiration_timeout: Duration,
    /// Whether hit/miss/write counters are maintained
    pub enable_statistics: bool,
    /// Retry budget handed to `update` by callers that don't pick their own
    pub max_retries: u32,
}

impl HandleConfiguration {
    /// Default retry budget for updates.
    pub const DEFAULT_MAX_RETRIES: u32 = 50;

    // == Constructor ==
    /// Creates a configuration with no default expiration and statistics on.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expiration_mode: ExpirationMode::None,
            expiration_timeout: Duration::ZERO,
            enable_statistics: true,
            max_retries: Self::DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_expiration(mut self, mode: ExpirationMode, timeout: Duration) -> Self {
        self.expiration_mode = mode;
        self.expiration_timeout = timeout;
        self
    }

    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.enable_statistics = enabled;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    // == Validate ==
    /// Rejects a timed default expiration without a timeout.
    ///
    /// The resolver raises the same error on every write, this lets callers
    /// fail at startup instead.
    pub fn validate(&self) -> Result<()> {
        if self.expiration_mode.is_timed() && self.expiration_timeout.is_zero() {
            return Err(missing_timeout());
        }
        Ok(())
    }
}

impl Default for HandleConfiguration {
    fn default() -> Self {
        Self::new("default")
    }
}

// == Resolve ==
/// Computes the effective expiration of `entry` under `config`.
///
/// An explicit per-entry request wins over the handle default. When neither
/// side asks for expiration the entry never expires. Returns a
/// configuration error when the effective mode is timed but the timeout is
/// zero.
pub fn resolve<V>(entry: CacheEntry<V>, config: &HandleConfiguration) -> Result<CacheEntry<V>> {
    let use_entry_expiration = entry.expiration_mode() != ExpirationMode::Default
        && !entry.uses_handle_default_expiration();

    let (mut mode, mut timeout) = if use_entry_expiration {
        (entry.expiration_mode(), entry.expiration_timeout())
    } else if config.expiration_mode != ExpirationMode::Default {
        (config.expiration_mode, config.expiration_timeout)
    } else {
        (ExpirationMode::None, Duration::ZERO)
    };

    if matches!(mode, ExpirationMode::None | ExpirationMode::Default) {
        mode = ExpirationMode::None;
        timeout = Duration::ZERO;
    } else if timeout.is_zero() {
        return Err(missing_timeout());
    }

    Ok(entry.with_resolved_expiration(mode, timeout, !use_entry_expiration))
}

fn missing_timeout() -> CacheError {
    CacheError::Configuration("ExpirationMode defined without a timeout".to_string())
}

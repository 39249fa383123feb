//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;

use crate::cache::{CacheEntry, ExpirationMode, MAX_KEY_LENGTH, MAX_VALUE_SIZE};

/// Explicit expiration requested for an entry
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExpirationRequest {
    pub mode: ExpirationMode,
    /// Timeout in seconds; ignored for `none` and `default`
    #[serde(default)]
    pub timeout_secs: u64,
}

impl ExpirationRequest {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request body for the SET operation (PUT /set)
///
/// Without `expiration` the entry follows the handle defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// Optional region qualifier
    #[serde(default)]
    pub region: Option<String>,
    /// The value to store
    pub value: String,
    #[serde(default)]
    pub expiration: Option<ExpirationRequest>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(error) = validate_key(&self.key) {
            return Some(error);
        }
        if self.value.len() > MAX_VALUE_SIZE {
            return Some(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            ));
        }
        None
    }

    /// Builds the cache entry described by this request.
    pub fn into_entry(self) -> CacheEntry<String> {
        let entry = match self.region {
            Some(region) => CacheEntry::in_region(self.key, region, self.value),
            None => CacheEntry::new(self.key, self.value),
        };
        match self.expiration {
            Some(expiration) => entry.with_expiration(expiration.mode, expiration.timeout()),
            None => entry,
        }
    }
}

/// Request body for POST /expire/:key
#[derive(Debug, Clone, Deserialize)]
pub struct ExpireRequest {
    #[serde(default)]
    pub region: Option<String>,
    pub mode: ExpirationMode,
    #[serde(default)]
    pub timeout_secs: u64,
}

/// Request body for POST /incr/:key
#[derive(Debug, Clone, Deserialize)]
pub struct IncrRequest {
    #[serde(default)]
    pub region: Option<String>,
    /// Amount to add, may be negative
    #[serde(default = "default_increment")]
    pub by: i64,
}

fn default_increment() -> i64 {
    1
}

/// Query string carrying an optional region (`?region=...`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionQuery {
    #[serde(default)]
    pub region: Option<String>,
}

/// Returns an error message for an unusable key.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert!(req.region.is_none());
        assert!(req.expiration.is_none());
    }

    #[test]
    fn test_set_request_with_expiration() {
        let json = r#"{"key": "test", "region": "r", "value": "hello",
                       "expiration": {"mode": "sliding", "timeout_secs": 60}}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();

        let entry = req.into_entry();
        assert_eq!(entry.region(), Some("r"));
        assert_eq!(entry.expiration_mode(), ExpirationMode::Sliding);
        assert_eq!(entry.expiration_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_set_request_without_expiration_defers_to_handle() {
        let req = SetRequest {
            key: "k".to_string(),
            region: None,
            value: "v".to_string(),
            expiration: None,
        };
        assert!(req.into_entry().uses_handle_default_expiration());
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            region: None,
            value: "test".to_string(),
            expiration: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key("valid_key").is_none());
    }

    #[test]
    fn test_expire_request_deserialize() {
        let req: ExpireRequest = serde_json::from_str(r#"{"mode": "none"}"#).unwrap();
        assert_eq!(req.mode, ExpirationMode::None);
        assert_eq!(req.timeout_secs, 0);
        assert!(serde_json::from_str::<ExpireRequest>(r#"{"mode": "forever"}"#).is_err());
    }

    #[test]
    fn test_incr_request_default_step() {
        let req: IncrRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.by, 1);
        assert!(req.region.is_none());
    }
}

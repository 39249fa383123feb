//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats, ExpirationMode};

/// Expiration metadata of a stored entry
#[derive(Debug, Clone, Serialize)]
pub struct ExpirationInfo {
    pub mode: ExpirationMode,
    pub timeout_secs: f64,
    pub uses_handle_default: bool,
    /// Expiration instant in RFC 3339, absent for entries that never expire
    pub expires_at: Option<String>,
}

impl ExpirationInfo {
    pub fn of<V>(entry: &CacheEntry<V>) -> Self {
        Self {
            mode: entry.expiration_mode(),
            timeout_secs: entry.expiration_timeout().as_secs_f64(),
            uses_handle_default: entry.uses_handle_default_expiration(),
            expires_at: entry.expires_at().map(|at| at.to_rfc3339()),
        }
    }
}

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    pub region: Option<String>,
    /// The stored value
    pub value: String,
    pub expiration: ExpirationInfo,
}

impl GetResponse {
    pub fn from_entry(entry: CacheEntry<String>) -> Self {
        let expiration = ExpirationInfo::of(&entry);
        Self {
            key: entry.key().to_string(),
            region: entry.region().map(str::to_string),
            expiration,
            value: entry.into_value(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Effective expiration after resolution
    pub expiration: ExpirationInfo,
}

impl SetResponse {
    pub fn from_entry<V>(entry: &CacheEntry<V>) -> Self {
        Self {
            message: format!("Key '{}' set successfully", entry.key()),
            key: entry.key().to_string(),
            expiration: ExpirationInfo::of(entry),
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for POST /expire/:key
#[derive(Debug, Clone, Serialize)]
pub struct ExpireResponse {
    pub message: String,
    pub key: String,
}

impl ExpireResponse {
    pub fn new(key: impl Into<String>, mode: ExpirationMode) -> Self {
        let key = key.into();
        Self {
            message: format!("Expiration of '{}' set to {}", key, mode),
            key,
        }
    }
}

/// Response body for POST /incr/:key
#[derive(Debug, Clone, Serialize)]
pub struct IncrResponse {
    pub key: String,
    pub value: i64,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Handle name
    pub name: String,
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(name: impl Into<String>, stats: CacheStats) -> Self {
        Self {
            name: name.into(),
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_get_response_serialize() {
        let entry = CacheEntry::in_region("test_key", "r", "test_value".to_string())
            .with_absolute_expiration(Duration::from_secs(30));
        let json = serde_json::to_value(GetResponse::from_entry(entry)).unwrap();

        assert_eq!(json["key"], "test_key");
        assert_eq!(json["region"], "r");
        assert_eq!(json["value"], "test_value");
        assert_eq!(json["expiration"]["mode"], "absolute");
        assert_eq!(json["expiration"]["timeout_secs"], 30.0);
        assert!(json["expiration"]["expires_at"].is_string());
    }

    #[test]
    fn test_set_response_serialize() {
        let entry = CacheEntry::new("my_key", 1).with_no_expiration();
        let json = serde_json::to_value(SetResponse::from_entry(&entry)).unwrap();

        assert!(json["message"].as_str().unwrap().contains("my_key"));
        assert_eq!(json["expiration"]["mode"], "none");
        assert!(json["expiration"]["expires_at"].is_null());
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("deleted_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("deleted_key"));
        assert!(json.contains("deleted"));
    }

    #[test]
    fn test_expire_response_message() {
        let resp = ExpireResponse::new("k", ExpirationMode::Sliding);
        assert_eq!(resp.message, "Expiration of 'k' set to sliding");
    }

    #[test]
    fn test_stats_response_flattens_counters() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_update();

        let json = serde_json::to_value(StatsResponse::new("cache", stats)).unwrap();
        assert_eq!(json["name"], "cache");
        assert_eq!(json["hits"], 3);
        assert_eq!(json["updates"], 1);
        assert!((json["hit_rate"].as_f64().unwrap() - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}

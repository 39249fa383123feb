//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::cache::{CacheHandle, UpdateOutcome};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    requests::validate_key, DeleteResponse, ExpireRequest, ExpireResponse, GetResponse,
    HealthResponse, IncrRequest, IncrResponse, RegionQuery, SetRequest, SetResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
///
/// The handle synchronizes internally, so it is shared without an outer lock.
#[derive(Clone)]
pub struct AppState {
    /// Cache handle over the in-memory store
    pub cache: Arc<CacheHandle<String>>,
}

impl AppState {
    /// Creates a new AppState around the given handle.
    pub fn new(cache: CacheHandle<String>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Registers an observer logging entries that expire or get evicted.
    pub fn from_config(config: &Config) -> Self {
        let cache = CacheHandle::in_memory(config.handle_configuration(), config.max_entries);
        cache.on_removed(|event| {
            info!(
                "Entry '{}' removed from region {:?}: {}",
                event.key, event.region, event.reason
            );
            Ok(())
        });
        Self::new(cache)
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair. The response carries the effective expiration.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let stored = state.cache.put(req.into_entry())?;
    Ok(Json(SetResponse::from_entry(&stored)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<RegionQuery>,
) -> Result<Json<GetResponse>> {
    let found = match query.region.as_deref() {
        Some(region) => state.cache.get_in_region(&key, region)?,
        None => state.cache.get(&key)?,
    };

    found
        .map(|entry| Json(GetResponse::from_entry(entry)))
        .ok_or(CacheError::NotFound(key))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<RegionQuery>,
) -> Result<Json<DeleteResponse>> {
    let removed = match query.region.as_deref() {
        Some(region) => state.cache.remove_in_region(&key, region)?,
        None => state.cache.remove(&key)?,
    };

    if !removed {
        return Err(CacheError::NotFound(key));
    }
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /expire/:key
///
/// Expiring a key that doesn't exist succeeds without effect.
pub async fn expire_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<ExpireRequest>,
) -> Result<Json<ExpireResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let timeout = Duration::from_secs(req.timeout_secs);
    match req.region.as_deref() {
        Some(region) => state
            .cache
            .expire_in_region(&key, region, req.mode, timeout)?,
        None => state.cache.expire(&key, req.mode, timeout)?,
    }

    Ok(Json(ExpireResponse::new(key, req.mode)))
}

/// Handler for POST /incr/:key
///
/// Adds `by` to an integer value through the handle's update protocol.
pub async fn incr_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<IncrRequest>,
) -> Result<Json<IncrResponse>> {
    let max_retries = state.cache.configuration().max_retries;
    let increment = |current: &String| {
        current
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|n| n.checked_add(req.by))
            .map(|n| n.to_string())
    };

    let outcome = match req.region.as_deref() {
        Some(region) => state
            .cache
            .update_in_region(&key, region, increment, max_retries)?,
        None => state.cache.update(&key, increment, max_retries)?,
    };

    match outcome {
        UpdateOutcome::Success(entry) => {
            let value: i64 = entry.value().parse().map_err(|_| {
                CacheError::Internal(format!("Stored value of '{}' is not an integer", key))
            })?;
            Ok(Json(IncrResponse { key, value }))
        }
        UpdateOutcome::ItemDidNotExist => Err(CacheError::NotFound(key)),
        UpdateOutcome::FactoryReturnedNull => Err(CacheError::UpdateRejected(format!(
            "Value of '{}' is not an integer or would overflow",
            key
        ))),
        UpdateOutcome::TooManyRetries => Err(CacheError::Conflict(format!(
            "Update of '{}' gave up after {} retries",
            key, max_retries
        ))),
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.name(), state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

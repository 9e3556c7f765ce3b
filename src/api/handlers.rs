//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{DatastoreCache, KeyedLocks};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteQuery, DeleteResponse, ErrorResponse, FlushRequest, GetQuery, GetResponse,
    HealthResponse, StatsResponse, StoreRequest, WriteResponse,
};
use crate::store::{FileStore, MemoryStore, RecordStore, StoreResult};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache facade
    pub cache: Arc<DatastoreCache>,
    /// Namespace used when a request names none
    pub default_namespace: Option<String>,
}

impl AppState {
    /// Creates a new AppState around the given facade.
    pub fn new(cache: DatastoreCache) -> Self {
        Self {
            cache: Arc::new(cache),
            default_namespace: None,
        }
    }

    /// Sets the namespace applied to requests without one.
    pub fn with_default_namespace(mut self, namespace: Option<String>) -> Self {
        self.default_namespace = namespace;
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the file store when `store_path` is set, otherwise keeps records
    /// in memory.
    pub fn from_config(config: &Config) -> StoreResult<Self> {
        let store: Arc<dyn RecordStore> = match &config.store_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => {
                info!("No STORE_PATH set, records are kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        let mut cache = DatastoreCache::new(store);
        if config.key_locking {
            cache = cache.with_coordinator(KeyedLocks::new());
        }

        Ok(Self::new(cache).with_default_namespace(config.default_namespace.clone()))
    }

    fn namespace(&self, requested: Option<String>) -> Option<String> {
        requested.or_else(|| self.default_namespace.clone())
    }

    /// Runs a facade call on the blocking pool, since stores do file IO.
    async fn run<T, F>(&self, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DatastoreCache) -> Result<T> + Send + 'static,
    {
        let cache = Arc::clone(&self.cache);
        tokio::task::spawn_blocking(move || call(&cache))
            .await
            .map_err(|e| CacheError::Internal(e.to_string()))?
    }
}

#[derive(Debug, Clone, Copy)]
enum StoreMode {
    Set,
    Add,
    Replace,
}

async fn store_entry(state: &AppState, req: StoreRequest, mode: StoreMode) -> Result<bool> {
    let key = req.cache_key()?;
    let ttl = req.ttl()?;
    let StoreRequest {
        value, namespace, ..
    } = req;
    let namespace = state.namespace(namespace);

    state
        .run(move |cache| {
            let namespace = namespace.as_deref();
            match mode {
                StoreMode::Set => cache.set(key, &value, ttl, namespace),
                StoreMode::Add => cache.add(key, &value, ttl, namespace),
                StoreMode::Replace => cache.replace(key, &value, ttl, namespace),
            }
        })
        .await
}

/// Handler for PUT /set
///
/// Stores a value regardless of previous contents.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<WriteResponse>> {
    let success = store_entry(&state, req, StoreMode::Set).await?;
    Ok(Json(WriteResponse::new(success)))
}

/// Handler for POST /add
///
/// Stores a value only if the key holds no valid entry.
pub async fn add_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<WriteResponse>> {
    let success = store_entry(&state, req, StoreMode::Add).await?;
    Ok(Json(WriteResponse::new(success)))
}

/// Handler for POST /replace
///
/// Stores a value only if the key already holds a valid entry.
pub async fn replace_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<WriteResponse>> {
    let success = store_entry(&state, req, StoreMode::Replace).await?;
    Ok(Json(WriteResponse::new(success)))
}

/// Handler for GET /get/:key
///
/// Returns 404 on a miss, including entries found expired.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<GetQuery>,
) -> Result<Response> {
    let namespace = state.namespace(query.namespace);
    let lookup_key = key.clone();

    let value = state
        .run(move |cache| -> Result<Option<Value>> {
            cache.get(lookup_key, namespace.as_deref(), query.delete_expired)
        })
        .await?;

    Ok(match value {
        Some(value) => Json(GetResponse::new(key, value)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Key not found: {}", key))),
        )
            .into_response(),
    })
}

/// Handler for DELETE /del/:key
///
/// Always answers 200; the memcache status is in the body.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeleteResponse>> {
    let namespace = state.namespace(query.namespace);
    let lookup_key = key.clone();

    let outcome = state
        .run(move |cache| cache.delete(lookup_key, query.seconds, namespace.as_deref()))
        .await?;

    Ok(Json(DeleteResponse::new(key, outcome)))
}

/// Handler for POST /flush
///
/// The body is optional; `max_items` defaults to the maximum. A body that
/// is present but malformed is rejected rather than defaulted.
pub async fn flush_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WriteResponse>> {
    let max_items = FlushRequest::from_body(&body)?.limit();

    let success = state.run(move |cache| cache.flush_all(max_items)).await?;
    Ok(Json(WriteResponse::new(success)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_state() -> AppState {
        AppState::new(DatastoreCache::new(Arc::new(MemoryStore::new())))
    }

    fn store_request(body: Value) -> Json<StoreRequest> {
        Json(serde_json::from_value(body).unwrap())
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = store_request(json!({"key": "test_key", "value": "test_value"}));
        let response = set_handler(State(state.clone()), req).await.unwrap();
        assert!(response.success);

        let query = Query(GetQuery {
            namespace: None,
            delete_expired: true,
        });
        let response = get_handler(State(state), Path("test_key".to_string()), query)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();
        let query = Query(GetQuery {
            namespace: None,
            delete_expired: true,
        });

        let response = get_handler(State(state), Path("nonexistent".to_string()), query)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_and_replace_handlers() {
        let state = test_state();

        let replaced = replace_handler(
            State(state.clone()),
            store_request(json!({"key": "k", "value": 1})),
        )
        .await
        .unwrap();
        assert!(!replaced.success);

        let added = add_handler(
            State(state.clone()),
            store_request(json!({"key": "k", "value": 1})),
        )
        .await
        .unwrap();
        assert!(added.success);

        let replaced = replace_handler(
            State(state),
            store_request(json!({"key": "k", "value": 2})),
        )
        .await
        .unwrap();
        assert!(replaced.success);
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        let req = store_request(json!({"key": "to_delete", "value": "value"}));
        set_handler(State(state.clone()), req).await.unwrap();

        let response = delete_handler(
            State(state.clone()),
            Path("to_delete".to_string()),
            Query(DeleteQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(response.code, 2);

        let response = delete_handler(
            State(state),
            Path("to_delete".to_string()),
            Query(DeleteQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(response.status, "ITEM_MISSING");
    }

    #[tokio::test]
    async fn test_default_namespace_is_applied() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(DatastoreCache::new(store.clone()))
            .with_default_namespace(Some("app:".to_string()));

        let req = store_request(json!({"key": "k", "value": "v"}));
        set_handler(State(state), req).await.unwrap();

        assert!(store.find_by_key("app:k").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_invalid_key() {
        let state = test_state();
        let req = store_request(json!({"key": ["only"], "value": "value"}));

        let result = set_handler(State(state), req).await;
        assert!(matches!(result, Err(CacheError::InvalidKeyType)));
    }

    #[tokio::test]
    async fn test_flush_handler_rejects_zero() {
        let state = test_state();
        let body = Bytes::from_static(br#"{"max_items": 0}"#);
        let result = flush_handler(State(state), body).await;
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_flush_handler_keeps_records_on_mistyped_limit() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(DatastoreCache::new(store.clone()));
        set_handler(State(state.clone()), store_request(json!({"key": "a", "value": 1})))
            .await
            .unwrap();

        let body = Bytes::from_static(br#"{"max_items": "1"}"#);
        let result = flush_handler(State(state), body).await;
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn test_from_config_with_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            store_path: Some(dir.path().join("cache.json")),
            key_locking: true,
            ..Config::default()
        };

        let state = AppState::from_config(&config).unwrap();
        assert!(state.cache.set("k", "v", 0, None).unwrap());
        assert!(dir.path().join("cache.json").exists());
    }
}

//! Redis cache backend.
//!
//! One `ConnectionManager` is shared across all networks' syncs; it
//! multiplexes concurrent commands and reconnects on its own after
//! transport loss, so a failed write surfaces as an error for that sync
//! attempt only and later writes recover without intervention.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use wasmwatch_core::{CacheStore, WatchError};

pub struct RedisCacheStore {
    manager: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to the cache store at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, WatchError> {
        tracing::info!(url, "connecting to cache store");
        let client = redis::Client::open(url)
            .map_err(|e| WatchError::Config(format!("invalid cache url: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| WatchError::Cache(e.to_string()))?;
        tracing::info!("connected to cache store");
        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), WatchError> {
        let mut conn = self.manager.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| WatchError::Cache(e.to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, WatchError> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|e| WatchError::Cache(e.to_string()))
    }
}

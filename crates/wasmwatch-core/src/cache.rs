//! The `CacheStore` trait — the seam between the sync engine and the cache.
//!
//! Backends live in `wasmwatch-cache` (Redis for production, an in-memory
//! map for tests). The store is treated as a durable string map with
//! last-write-wins semantics; individual `set` calls are independent keyed
//! writes, so concurrent syncs for different networks never conflict.

use async_trait::async_trait;

use crate::error::WatchError;

#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), WatchError>;

    /// Read the value under `key`, if any. Used for durable-cursor
    /// read-back at startup.
    async fn get(&self, key: &str) -> Result<Option<String>, WatchError>;
}

//! wasmwatch-cache — `CacheStore` backends.
//!
//! Redis for production, an in-memory map for tests and local runs.

pub mod memory;
pub mod redis_store;

pub use memory::MemoryCacheStore;
pub use redis_store::RedisCacheStore;

//! In-memory cache backend.
//!
//! A plain string map for tests and local development. All data is lost
//! when the process exits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use wasmwatch_core::{CacheStore, WatchError};

#[derive(Default)]
pub struct MemoryCacheStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current contents, for assertions.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.data.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), WatchError> {
        self.data.lock().unwrap().insert(key.into(), value.into());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, WatchError> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }
}

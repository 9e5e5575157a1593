//! services/api/src/adapters/memory_store.rs
//!
//! An in-process `KeyValueStore`. State lives as long as the server process.

use async_trait::async_trait;
use learning_path_core::ports::{KeyValueStore, PortResult, Update};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    /// Runs the whole read-modify-write under one write guard.
    async fn update(&self, key: &str, update: Update) -> PortResult<Option<String>> {
        let mut entries = self.entries.write().await;
        let next = update(entries.get(key).cloned())?;
        match &next {
            Some(value) => entries.insert(key.to_string(), value.clone()),
            None => entries.remove(key),
        };
        Ok(next)
    }
}

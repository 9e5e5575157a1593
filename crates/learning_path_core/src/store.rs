//! crates/learning_path_core/src/store.rs
//!
//! Typed access to one client's persisted state on top of a `KeyValueStore`:
//! learning-path history, the current custom topic, the cached module tree and
//! the set of completed chapters. The generation pipeline never touches this;
//! route handlers populate it after a successful run.
//!
//! Every read-modify-write goes through `KeyValueStore::update`, so concurrent
//! requests from the same client cannot drop each other's changes.

use crate::domain::{CustomTopic, HistoryEntry};
use crate::payload::Module;
use crate::ports::{KeyValueStore, PortError, PortResult};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Number of history entries kept per client.
pub const HISTORY_LIMIT: usize = 10;

const HISTORY_KEY: &str = "learningPathHistory";
const CUSTOM_TOPIC_KEY: &str = "customLanguage";
const MODULES_KEY: &str = "tutorModules";
const COMPLETED_KEY: &str = "completedChapters";

fn decode<T: DeserializeOwned>(name: &str, raw: &str) -> PortResult<T> {
    serde_json::from_str(raw)
        .map_err(|e| PortError::Unexpected(format!("stored '{}' is not valid JSON: {}", name, e)))
}

fn encode<T: Serialize + ?Sized>(value: &T) -> PortResult<String> {
    serde_json::to_string(value).map_err(|e| PortError::Unexpected(e.to_string()))
}

/// One client's view of the shared key-value store. Keys are namespaced by client id.
#[derive(Clone)]
pub struct ClientStore {
    kv: Arc<dyn KeyValueStore>,
    client_id: String,
}

impl ClientStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, client_id: impl Into<String>) -> Self {
        Self {
            kv,
            client_id: client_id.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{}", self.client_id, name)
    }

    async fn load<T: DeserializeOwned>(&self, name: &str) -> PortResult<Option<T>> {
        match self.kv.get(&self.key(name)).await? {
            None => Ok(None),
            Some(raw) => decode(name, &raw).map(Some),
        }
    }

    async fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> PortResult<()> {
        self.kv.set(&self.key(name), encode(value)?).await
    }

    /// Atomically loads the value under `name` (or its default), applies `change`
    /// and stores the result, returning what was stored.
    async fn modify<T, F>(&self, name: &'static str, change: F) -> PortResult<T>
    where
        T: Serialize + DeserializeOwned + Default + 'static,
        F: FnOnce(&mut T) + Send + 'static,
    {
        let stored = self
            .kv
            .update(
                &self.key(name),
                Box::new(move |current| {
                    let mut value: T = match current {
                        Some(raw) => decode(name, &raw)?,
                        None => T::default(),
                    };
                    change(&mut value);
                    encode(&value).map(Some)
                }),
            )
            .await?;
        match stored {
            Some(raw) => decode(name, &raw),
            None => Ok(T::default()),
        }
    }

    // --- History ---

    /// Newest first.
    pub async fn history(&self) -> PortResult<Vec<HistoryEntry>> {
        Ok(self.load(HISTORY_KEY).await?.unwrap_or_default())
    }

    /// Prepends `entry`, keeping only the most recent `HISTORY_LIMIT` entries.
    pub async fn record_history(&self, entry: HistoryEntry) -> PortResult<Vec<HistoryEntry>> {
        self.modify(HISTORY_KEY, move |history: &mut Vec<HistoryEntry>| {
            history.insert(0, entry);
            history.truncate(HISTORY_LIMIT);
        })
        .await
    }

    pub async fn clear_history(&self) -> PortResult<()> {
        self.kv.delete(&self.key(HISTORY_KEY)).await
    }

    // --- Custom topic ---

    pub async fn custom_topic(&self) -> PortResult<Option<CustomTopic>> {
        self.load(CUSTOM_TOPIC_KEY).await
    }

    /// Replaces the current custom topic. Switching to a different topic drops the
    /// cached modules and chapter progress that belonged to the old one.
    pub async fn set_custom_topic(&self, topic: &CustomTopic) -> PortResult<()> {
        let replacement = encode(topic)?;
        let (sender, previous) = tokio::sync::oneshot::channel();
        self.kv
            .update(
                &self.key(CUSTOM_TOPIC_KEY),
                Box::new(move |current| {
                    let _ = sender.send(current);
                    Ok(Some(replacement))
                }),
            )
            .await?;

        let previous: Option<CustomTopic> = match previous.await.ok().flatten() {
            Some(raw) => decode(CUSTOM_TOPIC_KEY, &raw).ok(),
            None => None,
        };
        if previous.is_some_and(|previous| previous != *topic) {
            info!(client = %self.client_id, "Custom topic changed, clearing cached path and progress.");
            self.kv.delete(&self.key(MODULES_KEY)).await?;
            self.kv.delete(&self.key(COMPLETED_KEY)).await?;
        }
        Ok(())
    }

    // --- Cached module tree ---

    pub async fn cached_modules(&self) -> PortResult<Option<Vec<Module>>> {
        self.load(MODULES_KEY).await
    }

    pub async fn cache_modules(&self, modules: &[Module]) -> PortResult<()> {
        self.save(MODULES_KEY, modules).await
    }

    // --- Chapter progress ---

    pub async fn completed_chapters(&self) -> PortResult<BTreeSet<String>> {
        Ok(self.load(COMPLETED_KEY).await?.unwrap_or_default())
    }

    /// Marks a chapter complete or incomplete and returns the updated set.
    pub async fn set_chapter_completed(
        &self,
        chapter_id: &str,
        completed: bool,
    ) -> PortResult<BTreeSet<String>> {
        let chapter_id = chapter_id.to_string();
        self.modify(COMPLETED_KEY, move |chapters: &mut BTreeSet<String>| {
            if completed {
                chapters.insert(chapter_id);
            } else {
                chapters.remove(&chapter_id);
            }
        })
        .await
    }
}

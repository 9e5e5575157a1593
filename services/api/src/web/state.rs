//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use learning_path_core::{ClientStore, GenerationPipeline, KeyValueStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: GenerationPipeline,
    pub store: Arc<dyn KeyValueStore>,
}

impl AppState {
    /// The persisted state belonging to one client.
    pub fn client(&self, client_id: &str) -> ClientStore {
        ClientStore::new(self.store.clone(), client_id)
    }
}

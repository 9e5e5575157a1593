//! crates/learning_path_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete generation API and of the client-state medium.

use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (network, storage).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Sends a single prompt to the text-generation model and returns its completion.
    async fn generate(&self, prompt: &str) -> PortResult<String>;
}

/// A read-modify-write step: receives the current value and returns the one to
/// store. Returning `None` removes the key.
pub type Update = Box<dyn FnOnce(Option<String>) -> PortResult<Option<String>> + Send>;

/// Key-value storage for per-client state (history, progress, cached paths).
///
/// Values are opaque strings; callers encode them as JSON.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> PortResult<()>;

    async fn delete(&self, key: &str) -> PortResult<()>;

    /// Applies `update` to the value under `key` atomically with respect to every
    /// other call on the same store, and returns the value now stored. If `update`
    /// fails, nothing is written.
    async fn update(&self, key: &str, update: Update) -> PortResult<Option<String>>;
}

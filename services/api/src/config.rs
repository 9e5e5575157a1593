//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use learning_path_core::{ExtractionMode, RetryPolicy};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub retry: RetryPolicy,
    pub extraction: ExtractionMode,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Generation API ---
        let api_key = var("GEMINI_API_KEY")
            .or_else(|| var("OPENAI_API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;
        let api_base = var("GENERATION_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let model = var("GENERATION_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string());

        // --- Pipeline Bounds ---
        let timeout_secs = parse_number(&var, "GENERATION_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "GENERATION_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let max_attempts = parse_number(&var, "GENERATION_MAX_ATTEMPTS", 3)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "GENERATION_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let backoff_ms = parse_number(&var, "GENERATION_BACKOFF_MS", 250)?;
        let retry = RetryPolicy {
            max_attempts: u32::try_from(max_attempts).unwrap_or(u32::MAX),
            base_delay: Duration::from_millis(backoff_ms),
            timeout: Duration::from_secs(timeout_secs),
            ..RetryPolicy::default()
        };

        let extraction = match var("JSON_EXTRACTION") {
            None => ExtractionMode::default(),
            Some(raw) => raw
                .parse::<ExtractionMode>()
                .map_err(|e| ConfigError::InvalidValue("JSON_EXTRACTION".to_string(), e))?,
        };

        Ok(Self {
            bind_address,
            log_level,
            api_key,
            api_base,
            model,
            retry,
            extraction,
            cors_origin,
        })
    }
}

fn parse_number(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
            ConfigError::InvalidValue(name.to_string(), format!("'{}': {}", raw, e))
        }),
    }
}

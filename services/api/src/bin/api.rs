//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{MemoryStore, OpenAiGenerationAdapter},
    config::Config,
    error::ApiError,
    web::{cors_layer, router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use learning_path_core::GenerationPipeline;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.api_key.clone())
        .with_api_base(config.api_base.clone());
    let generation_adapter = Arc::new(OpenAiGenerationAdapter::new(
        Client::with_config(openai_config),
        config.model.clone(),
    ));
    info!(model = %config.model, extraction = ?config.extraction, "Generation service configured.");

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        pipeline: GenerationPipeline::new(generation_adapter, config.retry, config.extraction),
        store: Arc::new(MemoryStore::new()),
    });

    // --- 4. Create the Web Router ---
    let app = router(app_state).layer(cors_layer(&config.cors_origin)?);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub mod client_state;
pub mod protocol;
pub mod rest;
pub mod state;

use crate::error::ApiError;
use crate::web::rest::ApiDoc;
use crate::web::state::AppState;
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application router: generation endpoints, client state,
/// and the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    let generation_routes = Router::new()
        .route("/api/assessment/questions", post(rest::questions_handler))
        .route("/api/assessment/self-check", post(rest::self_check_handler))
        .route("/api/generate-questions", post(rest::quick_questions_handler))
        .route("/api/evaluate-answers", post(rest::evaluate_answers_handler))
        .route("/api/generate-concepts", post(rest::generate_concepts_handler))
        .route("/api/generate-modules", post(rest::generate_modules_handler))
        .route("/api/generate-submodules", post(rest::generate_submodules_handler))
        .route("/api/generate-module", post(rest::generate_module_handler))
        .route("/api/learning-pathway", post(rest::learning_pathway_handler))
        .route(
            "/api/generate-concept-details",
            post(rest::generate_concept_details_handler),
        )
        .route("/api/generate-content", post(rest::generate_content_handler))
        .route("/api/tutor", post(rest::tutor_handler));

    let client_routes = Router::new()
        .route(
            "/api/history",
            get(client_state::list_history_handler).delete(client_state::clear_history_handler),
        )
        .route(
            "/api/custom-topic",
            get(client_state::get_custom_topic_handler).put(client_state::put_custom_topic_handler),
        )
        .route("/api/learning-path", get(client_state::learning_path_handler))
        .route("/api/progress", get(client_state::progress_handler))
        .route(
            "/api/progress/chapters/{chapter_id}",
            put(client_state::update_chapter_handler),
        );

    let api_router = Router::new()
        .merge(generation_routes)
        .merge(client_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// CORS for the browser client at `origin`.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, ApiError> {
    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin '{}': {}", origin, e)))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT, HeaderName::from_static("x-client-id")]))
}

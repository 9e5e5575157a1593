//! services/api/src/web/client_state.rs
//!
//! Handlers for the per-client state: history, current custom topic, the cached
//! learning path and chapter progress. Every route requires an `x-client-id` header.

use crate::web::{
    protocol::{ChapterProgressRequest, CustomLanguage, ErrorBody, ProgressResponse},
    rest::{parse_body, pipeline_failure, port_failure, require_client_id, HandlerError},
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use learning_path_core::{payload::ModuleList, CustomTopic, HistoryEntry, PipelineError};
use std::sync::Arc;

fn not_found(message: &str) -> HandlerError {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new(message, None)))
}

//=========================================================================================
// History
//=========================================================================================

/// List the client's history, newest first.
#[utoipa::path(
    get,
    path = "/api/history",
    responses(
        (status = 200, description = "Up to ten history entries, newest first"),
        (status = 400, description = "Missing x-client-id header", body = ErrorBody)
    ),
    params(("x-client-id" = String, Header, description = "The client's id."))
)]
pub async fn list_history_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<HistoryEntry>>, HandlerError> {
    let client_id = require_client_id(&headers)?;
    app_state
        .client(&client_id)
        .history()
        .await
        .map(Json)
        .map_err(port_failure)
}

/// Clear the client's history.
#[utoipa::path(
    delete,
    path = "/api/history",
    responses(
        (status = 204, description = "History cleared"),
        (status = 400, description = "Missing x-client-id header", body = ErrorBody)
    ),
    params(("x-client-id" = String, Header, description = "The client's id."))
)]
pub async fn clear_history_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, HandlerError> {
    let client_id = require_client_id(&headers)?;
    app_state
        .client(&client_id)
        .clear_history()
        .await
        .map_err(port_failure)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Custom Topic
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/custom-topic",
    responses(
        (status = 200, description = "The current custom topic"),
        (status = 404, description = "No custom topic set", body = ErrorBody)
    ),
    params(("x-client-id" = String, Header, description = "The client's id."))
)]
pub async fn get_custom_topic_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<CustomTopic>, HandlerError> {
    let client_id = require_client_id(&headers)?;
    app_state
        .client(&client_id)
        .custom_topic()
        .await
        .map_err(port_failure)?
        .map(Json)
        .ok_or_else(|| not_found("No custom topic set"))
}

/// Replace the current custom topic. A different topic clears the cached
/// learning path and chapter progress.
#[utoipa::path(
    put,
    path = "/api/custom-topic",
    request_body = CustomLanguage,
    responses(
        (status = 200, description = "The stored custom topic"),
        (status = 400, description = "Missing name or x-client-id header", body = ErrorBody)
    ),
    params(("x-client-id" = String, Header, description = "The client's id."))
)]
pub async fn put_custom_topic_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CustomLanguage>, JsonRejection>,
) -> Result<Json<CustomTopic>, HandlerError> {
    let client_id = require_client_id(&headers)?;
    let body = parse_body(body)?;
    let topic = CustomLanguage {
        is_custom: true,
        ..body
    }
    .into_topic()
    .ok_or_else(|| {
        pipeline_failure(PipelineError::BadRequest {
            fields: vec!["name".to_string()],
        })
    })?;

    app_state
        .client(&client_id)
        .set_custom_topic(&topic)
        .await
        .map_err(port_failure)?;
    Ok(Json(topic))
}

//=========================================================================================
// Learning Path and Progress
//=========================================================================================

/// The module outline last generated for this client.
#[utoipa::path(
    get,
    path = "/api/learning-path",
    responses(
        (status = 200, description = "The cached modules"),
        (status = 404, description = "No learning path generated yet", body = ErrorBody)
    ),
    params(("x-client-id" = String, Header, description = "The client's id."))
)]
pub async fn learning_path_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ModuleList>, HandlerError> {
    let client_id = require_client_id(&headers)?;
    app_state
        .client(&client_id)
        .cached_modules()
        .await
        .map_err(port_failure)?
        .map(|modules| Json(ModuleList { modules }))
        .ok_or_else(|| not_found("No learning path generated yet"))
}

#[utoipa::path(
    get,
    path = "/api/progress",
    responses(
        (status = 200, description = "Completed chapter ids", body = ProgressResponse),
        (status = 400, description = "Missing x-client-id header", body = ErrorBody)
    ),
    params(("x-client-id" = String, Header, description = "The client's id."))
)]
pub async fn progress_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProgressResponse>, HandlerError> {
    let client_id = require_client_id(&headers)?;
    let completed = app_state
        .client(&client_id)
        .completed_chapters()
        .await
        .map_err(port_failure)?;
    Ok(Json(ProgressResponse {
        completed_chapters: completed.into_iter().collect(),
    }))
}

/// Mark one chapter complete or incomplete.
#[utoipa::path(
    put,
    path = "/api/progress/chapters/{chapter_id}",
    request_body = ChapterProgressRequest,
    responses(
        (status = 200, description = "Updated completed chapter ids", body = ProgressResponse),
        (status = 400, description = "Missing x-client-id header", body = ErrorBody)
    ),
    params(
        ("chapter_id" = String, Path, description = "The chapter's id."),
        ("x-client-id" = String, Header, description = "The client's id.")
    )
)]
pub async fn update_chapter_handler(
    State(app_state): State<Arc<AppState>>,
    Path(chapter_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<ChapterProgressRequest>, JsonRejection>,
) -> Result<Json<ProgressResponse>, HandlerError> {
    let client_id = require_client_id(&headers)?;
    let body = parse_body(body)?;
    let completed = app_state
        .client(&client_id)
        .set_chapter_completed(&chapter_id, body.completed)
        .await
        .map_err(port_failure)?;
    Ok(Json(ProgressResponse {
        completed_chapters: completed.into_iter().collect(),
    }))
}

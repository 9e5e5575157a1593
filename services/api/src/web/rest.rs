//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the generation endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    client_state,
    protocol::{
        AnswerDto, AssessmentData, ConceptDetailsRequest, ConceptsRequest, ContentRequest,
        CustomLanguage, ErrorBody, EvaluateRequest, ModuleRequest, ModulesRequest, PathwayRequest,
        QuestionsRequest, QuickQuestionsRequest, SelfCheckRequest, SubmodulesRequest,
        TutorRequest,
    },
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use learning_path_core::{
    payload::{
        ConceptDetail, ConceptList, LessonContent, ModuleDetail, ModuleList,
        NumberedQuestionList, Pathway, QuestionList, SkillGapReport, SubmoduleList,
    },
    pipeline::{normalize, validate_request},
    prompt::{
        AssessmentQuestions, ChapterContentWriter, ChapterPlan, ConceptExplainer,
        ConceptSuggestions, LessonWriter, ModuleBlueprint, ModuleOutline, PathwayPlan,
        QuickQuestions, SkillGapAnalysis, SubmoduleOutline,
    },
    skill_gaps, CustomTopic, GenerationRequest, HistoryEntry, Normalized, PipelineError,
    PortError,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        questions_handler,
        quick_questions_handler,
        self_check_handler,
        evaluate_answers_handler,
        generate_concepts_handler,
        generate_modules_handler,
        generate_submodules_handler,
        generate_module_handler,
        learning_pathway_handler,
        generate_concept_details_handler,
        generate_content_handler,
        tutor_handler,
        client_state::list_history_handler,
        client_state::clear_history_handler,
        client_state::get_custom_topic_handler,
        client_state::put_custom_topic_handler,
        client_state::learning_path_handler,
        client_state::progress_handler,
        client_state::update_chapter_handler,
    ),
    components(
        schemas(
            ErrorBody, CustomLanguage, QuestionsRequest, SelfCheckRequest, AnswerDto,
            EvaluateRequest, ConceptsRequest, ModulesRequest, SubmodulesRequest,
            ConceptDetailsRequest, ContentRequest, AssessmentData, TutorRequest, ModuleRequest,
            QuickQuestionsRequest, PathwayRequest,
            crate::web::protocol::ChapterProgressRequest, crate::web::protocol::ProgressResponse,
        )
    ),
    tags(
        (name = "Learning Path API", description = "Generates assessments, learning paths and lessons.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// The error half of every handler's result.
pub type HandlerError = (StatusCode, Json<ErrorBody>);

const CLIENT_ID_HEADER: &str = "x-client-id";

fn failure(status: StatusCode, message: &str, details: Option<String>) -> HandlerError {
    (status, Json(ErrorBody::new(message, details)))
}

/// Maps a pipeline failure to its status and fixed message. Details never carry
/// completion text or upstream error bodies.
pub fn pipeline_failure(e: PipelineError) -> HandlerError {
    match e {
        PipelineError::BadRequest { fields } => failure(
            StatusCode::BAD_REQUEST,
            "Missing required fields",
            Some(fields.join(", ")),
        ),
        PipelineError::GenerationUnavailable(_) => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "The generation service is unavailable",
            None,
        ),
        PipelineError::NoJsonFound(shape) => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "The generated content did not contain JSON",
            Some(format!("expected a JSON {}", shape)),
        ),
        PipelineError::MalformedJson { line, column, .. } => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "The generated content was not valid JSON",
            Some(format!("line {}, column {}", line, column)),
        ),
        PipelineError::SchemaViolation(violation) => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "The generated content did not match the expected format",
            Some(violation.to_string()),
        ),
    }
}

pub fn port_failure(e: PortError) -> HandlerError {
    error!("Client state access failed: {:?}", e);
    failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to access client state",
        None,
    )
}

/// Unwraps a JSON body, turning axum's rejection into a 400 with our error shape.
pub fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, HandlerError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        failure(
            StatusCode::BAD_REQUEST,
            "Invalid request body",
            Some(rejection.body_text()),
        )
    })
}

/// The caller's client id, if the `x-client-id` header is present and non-blank.
pub fn client_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn require_client_id(headers: &HeaderMap) -> Result<String, HandlerError> {
    client_id(headers).ok_or_else(|| {
        failure(
            StatusCode::BAD_REQUEST,
            "x-client-id header is required",
            None,
        )
    })
}

//=========================================================================================
// Assessment Handlers
//=========================================================================================

/// Generate multiple-choice assessment questions for a topic.
#[utoipa::path(
    post,
    path = "/api/assessment/questions",
    request_body = QuestionsRequest,
    responses(
        (status = 200, description = "Questions with generation metadata"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    )
)]
pub async fn questions_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<QuestionsRequest>, JsonRejection>,
) -> Result<Json<Normalized<QuestionList>>, HandlerError> {
    let request = GenerationRequest::from(parse_body(body)?);
    app_state
        .pipeline
        .run(&AssessmentQuestions, &request)
        .await
        .map(Json)
        .map_err(pipeline_failure)
}

/// Generate five questions from a plain numbered list, optionally building on earlier answers.
///
/// Difficulty follows position: two beginner, two intermediate, then advanced.
#[utoipa::path(
    post,
    path = "/api/generate-questions",
    request_body = QuickQuestionsRequest,
    responses(
        (status = 200, description = "Questions with generation metadata"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    )
)]
pub async fn quick_questions_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<QuickQuestionsRequest>, JsonRejection>,
) -> Result<Json<Normalized<NumberedQuestionList>>, HandlerError> {
    let request = GenerationRequest::from(parse_body(body)?);
    app_state
        .pipeline
        .run(&QuickQuestions, &request)
        .await
        .map(Json)
        .map_err(pipeline_failure)
}

/// Build familiarity questions for a custom topic's concepts without calling the model.
#[utoipa::path(
    post,
    path = "/api/assessment/self-check",
    request_body = SelfCheckRequest,
    responses(
        (status = 200, description = "One familiarity question per concept"),
        (status = 400, description = "Missing required fields", body = ErrorBody)
    )
)]
pub async fn self_check_handler(
    body: Result<Json<SelfCheckRequest>, JsonRejection>,
) -> Result<Json<Normalized<QuestionList>>, HandlerError> {
    let body = parse_body(body)?;
    let language = body.language.unwrap_or_default();
    let questions = QuestionList::self_assessment(&body.concepts);

    let mut missing = Vec::new();
    if language.trim().is_empty() {
        missing.push("language".to_string());
    }
    if questions.questions.is_empty() {
        missing.push("concepts".to_string());
    }
    if !missing.is_empty() {
        return Err(pipeline_failure(PipelineError::BadRequest { fields: missing }));
    }

    let request = GenerationRequest::new(language.trim()).with_custom_topic(CustomTopic {
        name: language.trim().to_string(),
        description: String::new(),
        concepts: body.concepts,
    });
    Ok(Json(normalize(questions, &request, Utc::now())))
}

/// Analyse graded answers into a skill-gap report and learning path.
///
/// When every answer is correct the fixed "no gaps" report is returned without a model call.
#[utoipa::path(
    post,
    path = "/api/evaluate-answers",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Skill-gap report with generation metadata"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    )
)]
pub async fn evaluate_answers_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<Normalized<SkillGapReport>>, HandlerError> {
    let body = parse_body(body)?;
    let gaps = skill_gaps(&body.graded_answers());
    let request = GenerationRequest::from(body).with_skill_gaps(gaps);
    validate_request(&SkillGapAnalysis, &request).map_err(pipeline_failure)?;

    if request.skill_gaps.is_empty() {
        info!(topic = %request.topic.trim(), "All answers correct, skipping skill-gap analysis.");
        return Ok(Json(normalize(SkillGapReport::no_gaps(), &request, Utc::now())));
    }
    app_state
        .pipeline
        .run(&SkillGapAnalysis, &request)
        .await
        .map(Json)
        .map_err(pipeline_failure)
}

//=========================================================================================
// Outline Handlers
//=========================================================================================

/// Suggest key concepts for a custom topic.
#[utoipa::path(
    post,
    path = "/api/generate-concepts",
    request_body = ConceptsRequest,
    responses(
        (status = 200, description = "Suggested concepts"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    )
)]
pub async fn generate_concepts_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<ConceptsRequest>, JsonRejection>,
) -> Result<Json<Normalized<ConceptList>>, HandlerError> {
    let request = GenerationRequest::from(parse_body(body)?);
    app_state
        .pipeline
        .run(&ConceptSuggestions, &request)
        .await
        .map(Json)
        .map_err(pipeline_failure)
}

/// Generate the module outline for a topic.
///
/// With an `x-client-id` header the outline is also cached as the client's learning path.
#[utoipa::path(
    post,
    path = "/api/generate-modules",
    request_body = ModulesRequest,
    responses(
        (status = 200, description = "Modules with generation metadata"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    ),
    params(
        ("x-client-id" = Option<String>, Header, description = "Caches the outline for this client.")
    )
)]
pub async fn generate_modules_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ModulesRequest>, JsonRejection>,
) -> Result<Json<Normalized<ModuleList>>, HandlerError> {
    let request = GenerationRequest::from(parse_body(body)?);
    let outline = app_state
        .pipeline
        .run(&ModuleOutline, &request)
        .await
        .map_err(pipeline_failure)?;

    if let Some(id) = client_id(&headers) {
        if let Err(e) = app_state
            .client(&id)
            .cache_modules(&outline.payload.modules)
            .await
        {
            warn!(client = %id, "Failed to cache generated modules: {:?}", e);
        }
    }
    Ok(Json(outline))
}

/// Break a module into submodules.
#[utoipa::path(
    post,
    path = "/api/generate-submodules",
    request_body = SubmodulesRequest,
    responses(
        (status = 200, description = "Submodules with generation metadata"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    )
)]
pub async fn generate_submodules_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<SubmodulesRequest>, JsonRejection>,
) -> Result<Json<Normalized<SubmoduleList>>, HandlerError> {
    let request = GenerationRequest::from(parse_body(body)?);
    app_state
        .pipeline
        .run(&SubmoduleOutline, &request)
        .await
        .map(Json)
        .map_err(pipeline_failure)
}

/// Generate one complete module, every chapter with its content.
#[utoipa::path(
    post,
    path = "/api/generate-module",
    request_body = ModuleRequest,
    responses(
        (status = 200, description = "The module with generation metadata"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    )
)]
pub async fn generate_module_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<ModuleRequest>, JsonRejection>,
) -> Result<Json<Normalized<ModuleDetail>>, HandlerError> {
    let request = GenerationRequest::from(parse_body(body)?);
    app_state
        .pipeline
        .run(&ModuleBlueprint, &request)
        .await
        .map(Json)
        .map_err(pipeline_failure)
}

/// Lay out a stepwise pathway of linked topics.
#[utoipa::path(
    post,
    path = "/api/learning-pathway",
    request_body = PathwayRequest,
    responses(
        (status = 200, description = "Pathway steps with generation metadata"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    )
)]
pub async fn learning_pathway_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<PathwayRequest>, JsonRejection>,
) -> Result<Json<Normalized<Pathway>>, HandlerError> {
    let request = GenerationRequest::from(parse_body(body)?);
    app_state
        .pipeline
        .run(&PathwayPlan, &request)
        .await
        .map(Json)
        .map_err(pipeline_failure)
}

//=========================================================================================
// Content Handlers
//=========================================================================================

/// Explain one concept in depth.
#[utoipa::path(
    post,
    path = "/api/generate-concept-details",
    request_body = ConceptDetailsRequest,
    responses(
        (status = 200, description = "Concept explanation with generation metadata"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    )
)]
pub async fn generate_concept_details_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<ConceptDetailsRequest>, JsonRejection>,
) -> Result<Json<Normalized<ConceptDetail>>, HandlerError> {
    let request = GenerationRequest::from(parse_body(body)?);
    app_state
        .pipeline
        .run(&ConceptExplainer, &request)
        .await
        .map(Json)
        .map_err(pipeline_failure)
}

/// Write the HTML lesson for a submodule.
#[utoipa::path(
    post,
    path = "/api/generate-content",
    request_body = ContentRequest,
    responses(
        (status = 200, description = "Lesson content with generation metadata"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    )
)]
pub async fn generate_content_handler(
    State(app_state): State<Arc<AppState>>,
    body: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<Normalized<LessonContent>>, HandlerError> {
    let request = GenerationRequest::from(parse_body(body)?);
    app_state
        .pipeline
        .run(&LessonWriter, &request)
        .await
        .map(Json)
        .map_err(pipeline_failure)
}

/// Plan the chapters of a learning path, optionally focused on one module, or
/// write the full content of one chapter when `chapter` is given.
///
/// The module branch needs both `moduleTitle` and `moduleDescription`. With an
/// `x-client-id` header, a successful generation for a custom topic is recorded
/// in the client's history.
#[utoipa::path(
    post,
    path = "/api/tutor",
    request_body = TutorRequest,
    responses(
        (status = 200, description = "Chapters, or one chapter's content, with generation metadata"),
        (status = 400, description = "Missing required fields", body = ErrorBody),
        (status = 500, description = "Generation or validation failed", body = ErrorBody)
    ),
    params(
        ("x-client-id" = Option<String>, Header, description = "Records the topic in this client's history.")
    )
)]
pub async fn tutor_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<TutorRequest>, JsonRejection>,
) -> Result<Response, HandlerError> {
    let body = parse_body(body)?;
    let names_chapter = body.names_chapter();
    let request = GenerationRequest::from(body);

    let (generated_at, response) = if names_chapter {
        let chapter = app_state
            .pipeline
            .run(&ChapterContentWriter, &request)
            .await
            .map_err(pipeline_failure)?;
        (chapter.metadata.generated_at, Json(chapter).into_response())
    } else {
        let plan = app_state
            .pipeline
            .run(&ChapterPlan, &request)
            .await
            .map_err(pipeline_failure)?;
        (plan.metadata.generated_at, Json(plan).into_response())
    };

    if let (Some(id), Some(custom)) = (client_id(&headers), &request.custom_topic) {
        let entry = HistoryEntry::for_tutor(&custom.name, &custom.description, generated_at);
        if let Err(e) = app_state.client(&id).record_history(entry).await {
            warn!(client = %id, "Failed to record history: {:?}", e);
        }
    }
    Ok(response)
}

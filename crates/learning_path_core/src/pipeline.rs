//! crates/learning_path_core/src/pipeline.rs
//!
//! The generation pipeline: validate the request, render the prompt, call the
//! model, extract the embedded document, validate it, and wrap it with request
//! metadata. Every failure is terminal for the request; only the model call
//! itself is retried, and only within the configured bound.

use crate::domain::GenerationRequest;
use crate::extract::{extract_document, ExtractionMode, JsonShape};
use crate::ports::GenerationService;
use crate::prompt::PromptTemplate;
use crate::schema::{conform, Schema, SchemaContext, SchemaViolation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

//=========================================================================================
// Errors and Stages
//=========================================================================================

/// The stages a single pipeline run passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Prompting,
    Generating,
    Extracting,
    ValidatingSchema,
    Done,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("missing required field(s): {}", .fields.join(", "))]
    BadRequest { fields: Vec<String> },

    #[error("generation service unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("no JSON {0} found in the completion")]
    NoJsonFound(JsonShape),

    #[error("malformed JSON at line {line}, column {column}: {message}")]
    MalformedJson {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("schema violation: {0}")]
    SchemaViolation(#[from] SchemaViolation),
}

impl PipelineError {
    /// The stage the run was in when it failed.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::BadRequest { .. } => PipelineStage::Validating,
            PipelineError::GenerationUnavailable(_) => PipelineStage::Generating,
            PipelineError::NoJsonFound(_) => PipelineStage::Extracting,
            PipelineError::MalformedJson { .. } | PipelineError::SchemaViolation(_) => {
                PipelineStage::ValidatingSchema
            }
        }
    }

    /// Stable, machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::BadRequest { .. } => "bad_request",
            PipelineError::GenerationUnavailable(_) => "generation_unavailable",
            PipelineError::NoJsonFound(_) => "no_json_found",
            PipelineError::MalformedJson { .. } => "malformed_json",
            PipelineError::SchemaViolation(_) => "schema_violation",
        }
    }
}

//=========================================================================================
// Retry Policy
//=========================================================================================

/// Bounds on the model call: per-attempt timeout, attempt cap, and exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A single attempt with the given timeout.
    pub fn single_attempt(timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            timeout,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based): base * 2^(attempt - 1), capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

//=========================================================================================
// Normalized Output
//=========================================================================================

/// Request-echoing metadata attached to every successful payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub topic: String,
    pub generated_at: DateTime<Utc>,
    pub is_custom: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skill_gaps: Vec<String>,
}

/// A validated payload with its metadata. Serializes as the payload's own fields
/// plus a `metadata` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized<P> {
    #[serde(flatten)]
    pub payload: P,
    pub metadata: GenerationMetadata,
}

/// Wraps `payload` with metadata from `request`, leaving the payload untouched.
pub fn normalize<P>(payload: P, request: &GenerationRequest, now: DateTime<Utc>) -> Normalized<P> {
    Normalized {
        payload,
        metadata: GenerationMetadata {
            topic: request.topic.trim().to_string(),
            generated_at: now,
            is_custom: request.is_custom(),
            skill_gaps: request.skill_gaps.clone(),
        },
    }
}

//=========================================================================================
// Stateless Stages
//=========================================================================================

/// Confirms every field the template requires, reporting all missing ones at once.
pub fn validate_request<T: PromptTemplate>(
    template: &T,
    request: &GenerationRequest,
) -> Result<(), PipelineError> {
    let fields: Vec<String> = template
        .required_fields()
        .iter()
        .filter(|(field, _)| !field.is_present(request))
        .map(|(_, name)| name.to_string())
        .collect();
    if fields.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::BadRequest { fields })
    }
}

/// Extracts, parses and validates a completion against `S`.
pub fn interpret<S: Schema>(
    completion: &str,
    mode: ExtractionMode,
    context: &SchemaContext,
) -> Result<S, PipelineError> {
    let document = match S::SHAPE {
        JsonShape::Text => Value::String(completion.to_string()),
        shape => {
            let span = extract_document(completion, shape, mode)
                .ok_or(PipelineError::NoJsonFound(shape))?;
            serde_json::from_str(span).map_err(|e| PipelineError::MalformedJson {
                line: e.line(),
                column: e.column(),
                message: e.to_string(),
            })?
        }
    };
    Ok(conform::<S>(document, context)?)
}

//=========================================================================================
// The Pipeline
//=========================================================================================

/// Runs prompt templates against a generation service. Holds no per-request state.
#[derive(Clone)]
pub struct GenerationPipeline {
    service: Arc<dyn GenerationService>,
    policy: RetryPolicy,
    extraction: ExtractionMode,
}

impl GenerationPipeline {
    /// Creates a new `GenerationPipeline`.
    pub fn new(
        service: Arc<dyn GenerationService>,
        policy: RetryPolicy,
        extraction: ExtractionMode,
    ) -> Self {
        Self {
            service,
            policy,
            extraction,
        }
    }

    pub fn extraction_mode(&self) -> ExtractionMode {
        self.extraction
    }

    /// Runs `template` for `request` and returns the normalized payload.
    pub async fn run<T: PromptTemplate>(
        &self,
        template: &T,
        request: &GenerationRequest,
    ) -> Result<Normalized<T::Payload>, PipelineError> {
        let started = Instant::now();
        info!(template = template.name(), topic = %request.topic.trim(), "Generation pipeline started.");

        let result = self.run_stages(template, request).await;
        match &result {
            Ok(_) => info!(
                template = template.name(),
                elapsed = ?started.elapsed(),
                "Generation pipeline finished."
            ),
            Err(e) => error!(
                template = template.name(),
                kind = e.kind(),
                stage = ?e.stage(),
                error = %e,
                "Generation pipeline failed."
            ),
        }
        result
    }

    async fn run_stages<T: PromptTemplate>(
        &self,
        template: &T,
        request: &GenerationRequest,
    ) -> Result<Normalized<T::Payload>, PipelineError> {
        debug!(stage = ?PipelineStage::Validating);
        validate_request(template, request)?;

        debug!(stage = ?PipelineStage::Prompting);
        let prompt = template.render(request);

        debug!(stage = ?PipelineStage::Generating, prompt_len = prompt.len());
        let completion = self.generate(&prompt).await?;
        debug!(completion = %completion, "Received completion.");

        debug!(stage = ?PipelineStage::Extracting, mode = ?self.extraction);
        let context = SchemaContext {
            open_difficulty: request.is_custom(),
        };
        let payload = interpret::<T::Payload>(&completion, self.extraction, &context)?;

        debug!(stage = ?PipelineStage::Done);
        Ok(normalize(payload, request, Utc::now()))
    }

    /// Calls the model with a per-attempt timeout, retrying failed or empty
    /// completions with exponential backoff until the attempt cap.
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let failure = match tokio::time::timeout(self.policy.timeout, self.service.generate(prompt)).await {
                Ok(Ok(text)) if !text.trim().is_empty() => return Ok(text),
                Ok(Ok(_)) => "the model returned an empty completion".to_string(),
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("no completion within {:?}", self.policy.timeout),
            };

            if attempt >= max_attempts {
                return Err(PipelineError::GenerationUnavailable(failure));
            }
            let delay = self.policy.backoff(attempt);
            warn!(attempt, max_attempts, ?delay, error = %failure, "Generation attempt failed, retrying.");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CustomTopic;
    use crate::payload::{ConceptList, QuestionList, SkillGapReport};
    use crate::ports::{PortError, PortResult};
    use crate::prompt::{AssessmentQuestions, ConceptSuggestions, ModuleOutline, SkillGapAnalysis};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted replies and counts calls.
    struct ScriptedService {
        replies: Mutex<VecDeque<PortResult<String>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedService {
        fn new(replies: Vec<PortResult<String>>) -> Arc<Self> {
            Self::slow(replies, Duration::ZERO)
        }

        fn slow(replies: Vec<PortResult<String>>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationService for ScriptedService {
        async fn generate(&self, _prompt: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PortError::Unexpected("script exhausted".into())))
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            timeout: Duration::from_secs(5),
        }
    }

    fn pipeline(service: Arc<ScriptedService>, max_attempts: u32) -> GenerationPipeline {
        GenerationPipeline::new(service, fast_policy(max_attempts), ExtractionMode::Balanced)
    }

    const QUESTIONS: &str = r#"Here are your questions:
```json
{"questions": [
  {"id": 1, "question": "What is a closure?", "difficulty": "intermediate", "concept": "Closures"}
]}
```"#;

    #[tokio::test]
    async fn well_formed_completion_is_validated_and_normalized() {
        let service = ScriptedService::new(vec![Ok(QUESTIONS.to_string())]);
        let output = pipeline(service.clone(), 1)
            .run(&AssessmentQuestions, &GenerationRequest::new(" JavaScript "))
            .await
            .unwrap();

        assert_eq!(output.payload.questions.len(), 1);
        assert_eq!(output.metadata.topic, "JavaScript");
        assert!(!output.metadata.is_custom);
        assert_eq!(service.calls(), 1);

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["questions"][0]["concept"], "Closures");
        assert_eq!(json["metadata"]["isCustom"], false);
        assert!(json["metadata"].get("skillGaps").is_none());
    }

    #[tokio::test]
    async fn blank_topic_is_rejected_before_any_call() {
        let service = ScriptedService::new(vec![Ok(QUESTIONS.to_string())]);
        let err = pipeline(service.clone(), 3)
            .run(&AssessmentQuestions, &GenerationRequest::new("   "))
            .await
            .unwrap_err();

        assert!(matches!(&err, PipelineError::BadRequest { fields } if fields == &["language"]));
        assert_eq!(err.stage(), PipelineStage::Validating);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn every_missing_field_is_reported() {
        let service = ScriptedService::new(vec![]);
        let err = pipeline(service.clone(), 1)
            .run(&ModuleOutline, &GenerationRequest::new("Physics"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "missing required field(s): description, concepts");
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn completion_without_braces_is_no_json_found() {
        let service = ScriptedService::new(vec![Ok("I cannot help with that.".into())]);
        let err = pipeline(service, 1)
            .run(&AssessmentQuestions, &GenerationRequest::new("Rust"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoJsonFound(JsonShape::Object)));
        assert_eq!(err.stage(), PipelineStage::Extracting);
    }

    #[tokio::test]
    async fn invalid_syntax_between_braces_is_malformed_json() {
        let service = ScriptedService::new(vec![Ok("{questions: [oops]}".into())]);
        let err = pipeline(service, 1)
            .run(&AssessmentQuestions, &GenerationRequest::new("Rust"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::MalformedJson { line: 1, .. }));
    }

    #[tokio::test]
    async fn empty_question_list_is_a_schema_violation() {
        let service = ScriptedService::new(vec![Ok(r#"Sure! {"questions": []}"#.into())]);
        let err = pipeline(service, 1)
            .run(&AssessmentQuestions, &GenerationRequest::new("Rust"))
            .await
            .unwrap_err();

        match err {
            PipelineError::SchemaViolation(violation) => {
                assert_eq!(violation.to_string(), "questions is empty")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn greedy_and_balanced_disagree_on_two_objects() {
        let completion = r#"{"a":1} junk {"b":2}"#;

        #[derive(Serialize, serde::Deserialize)]
        struct Anything {
            a: i64,
        }
        impl Schema for Anything {
            const ROOT: &'static str = "anything";
            const SHAPE: JsonShape = JsonShape::Object;
            fn validate(_: &Value, _: &SchemaContext) -> Result<(), SchemaViolation> {
                Ok(())
            }
        }

        let context = SchemaContext::default();
        let greedy = interpret::<Anything>(completion, ExtractionMode::Greedy, &context);
        assert!(matches!(greedy, Err(PipelineError::MalformedJson { .. })));

        let balanced = interpret::<Anything>(completion, ExtractionMode::Balanced, &context).unwrap();
        assert_eq!(balanced.a, 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_up_to_the_cap() {
        let service = ScriptedService::new(vec![
            Err(PortError::Unavailable("503".into())),
            Ok("   ".into()),
            Ok(QUESTIONS.to_string()),
        ]);
        let output = pipeline(service.clone(), 3)
            .run(&AssessmentQuestions, &GenerationRequest::new("Rust"))
            .await
            .unwrap();

        assert_eq!(output.payload.questions[0].question, "What is a closure?");
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_generation_unavailable() {
        let service = ScriptedService::new(vec![
            Err(PortError::Unavailable("503".into())),
            Err(PortError::Unavailable("503".into())),
            Ok(QUESTIONS.to_string()),
        ]);
        let err = pipeline(service.clone(), 2)
            .run(&AssessmentQuestions, &GenerationRequest::new("Rust"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::GenerationUnavailable(_)));
        assert_eq!(err.stage(), PipelineStage::Generating);
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test]
    async fn extraction_failures_are_not_retried() {
        let service = ScriptedService::new(vec![Ok("no json".into()), Ok(QUESTIONS.to_string())]);
        let err = pipeline(service.clone(), 3)
            .run(&AssessmentQuestions, &GenerationRequest::new("Rust"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "no_json_found");
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let service = ScriptedService::slow(vec![Ok(QUESTIONS.to_string())], Duration::from_millis(200));
        let policy = RetryPolicy::single_attempt(Duration::from_millis(20));
        let err = GenerationPipeline::new(service, policy, ExtractionMode::Balanced)
            .run(&AssessmentQuestions, &GenerationRequest::new("Rust"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::GenerationUnavailable(ref msg) if msg.starts_with("no completion within")));
    }

    #[tokio::test]
    async fn custom_topics_accept_open_difficulty_tags_and_echo_the_flag() {
        let completion = r#"{"questions": [{"question": "Rate yourself on isomers", "difficulty": "custom", "concept": "Isomers"}]}"#;
        let service = ScriptedService::new(vec![Ok(completion.into())]);
        let request = GenerationRequest::new("Organic Chemistry").with_custom_topic(CustomTopic {
            name: "Organic Chemistry".into(),
            description: "Carbon compounds".into(),
            concepts: vec!["Isomers".into()],
        });
        let output: Normalized<QuestionList> = pipeline(service, 1)
            .run(&AssessmentQuestions, &request)
            .await
            .unwrap();

        assert!(output.metadata.is_custom);
    }

    #[tokio::test]
    async fn skill_gap_report_with_broken_resource_names_the_path() {
        let completion = r#"{
            "skillGap": {"title": "Loops", "detail": "Off-by-one errors"},
            "learningPath": [
                {"title": "A", "description": "a", "resources": []},
                {"title": "B", "description": "b", "resources": []},
                {"title": "C", "description": "c", "resources": [{"title": "Guide", "type": "article"}]}
            ]
        }"#;
        let service = ScriptedService::new(vec![Ok(completion.into())]);
        let request = GenerationRequest::new("Python").with_skill_gaps(vec!["Loops".into()]);
        let err = pipeline(service, 1)
            .run(&SkillGapAnalysis, &request)
            .await
            .unwrap_err();

        match err {
            PipelineError::SchemaViolation(violation) => {
                assert_eq!(violation.path, "learningPath[2].resources[0].url")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn skill_gaps_are_echoed_in_metadata() {
        let report = serde_json::to_string(&SkillGapReport::no_gaps()).unwrap();
        let service = ScriptedService::new(vec![Ok(report)]);
        let request = GenerationRequest::new("Python").with_skill_gaps(vec!["Decorators".into()]);
        let output = pipeline(service, 1).run(&SkillGapAnalysis, &request).await.unwrap();

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["metadata"]["skillGaps"][0], "Decorators");
        assert_eq!(json["skillGap"]["title"], "No significant skill gaps detected");
    }

    #[tokio::test]
    async fn text_payloads_skip_extraction() {
        let service = ScriptedService::new(vec![Ok("Alkanes, Alkenes, Isomers".into())]);
        let request = GenerationRequest::new("Organic Chemistry").with_description("Carbon compounds");
        let output: Normalized<ConceptList> = pipeline(service, 1)
            .run(&ConceptSuggestions, &request)
            .await
            .unwrap();

        assert_eq!(output.payload.concepts, vec!["Alkanes", "Alkenes", "Isomers"]);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(500));
        assert_eq!(policy.backoff(64), Duration::from_millis(500));
    }

    #[test]
    fn normalize_leaves_the_payload_untouched() {
        let payload = SkillGapReport::no_gaps();
        let now = Utc::now();
        let output = normalize(payload.clone(), &GenerationRequest::new("Go"), now);
        assert_eq!(output.payload, payload);
        assert_eq!(output.metadata.generated_at, now);
    }
}

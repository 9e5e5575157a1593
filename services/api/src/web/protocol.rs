//! services/api/src/web/protocol.rs
//!
//! Defines the JSON bodies exchanged between the browser client and the API server.
//! Field names are camelCase on the wire. Every field is optional at the
//! deserialization level so that missing values reach request validation and are
//! reported by name instead of as a generic parse failure.

use learning_path_core::{CustomTopic, GenerationRequest, GradedAnswer};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Drops blank strings.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//=========================================================================================
// Shared Pieces
//=========================================================================================

/// A user-defined topic as the client describes it.
#[derive(Deserialize, Serialize, Debug, Clone, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomLanguage {
    pub name: String,
    pub description: String,
    pub concepts: Vec<String>,
    pub is_custom: bool,
}

impl CustomLanguage {
    /// The custom topic this descriptor names, if it is flagged custom and has a name.
    pub fn into_topic(self) -> Option<CustomTopic> {
        if !self.is_custom || self.name.trim().is_empty() {
            return None;
        }
        Some(CustomTopic {
            name: self.name.trim().to_string(),
            description: self.description,
            concepts: self.concepts,
        })
    }
}

/// The body of every error response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}

//=========================================================================================
// Assessment
//=========================================================================================

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionsRequest {
    pub language: Option<String>,
    pub custom_language: Option<CustomLanguage>,
}

impl From<QuestionsRequest> for GenerationRequest {
    fn from(body: QuestionsRequest) -> Self {
        GenerationRequest {
            topic: body.language.unwrap_or_default(),
            custom_topic: body.custom_language.and_then(CustomLanguage::into_topic),
            ..Default::default()
        }
    }
}

/// Asks for locally built familiarity questions, one per concept.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SelfCheckRequest {
    pub language: Option<String>,
    pub concepts: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDto {
    pub skill: String,
    pub is_correct: bool,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EvaluateRequest {
    pub language: Option<String>,
    pub answers: Vec<AnswerDto>,
    pub custom_language: Option<CustomLanguage>,
}

impl EvaluateRequest {
    pub fn graded_answers(&self) -> Vec<GradedAnswer> {
        self.answers
            .iter()
            .map(|answer| GradedAnswer {
                skill: answer.skill.clone(),
                is_correct: answer.is_correct,
            })
            .collect()
    }
}

impl From<EvaluateRequest> for GenerationRequest {
    fn from(body: EvaluateRequest) -> Self {
        GenerationRequest {
            topic: body.language.unwrap_or_default(),
            custom_topic: body.custom_language.and_then(CustomLanguage::into_topic),
            ..Default::default()
        }
    }
}

//=========================================================================================
// Topic Outlines
//=========================================================================================

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConceptsRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<ConceptsRequest> for GenerationRequest {
    fn from(body: ConceptsRequest) -> Self {
        GenerationRequest {
            topic: body.name.unwrap_or_default(),
            description: present(body.description),
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ModulesRequest {
    pub topic: Option<String>,
    pub description: Option<String>,
    pub concepts: Vec<String>,
}

impl From<ModulesRequest> for GenerationRequest {
    fn from(body: ModulesRequest) -> Self {
        GenerationRequest {
            topic: body.topic.unwrap_or_default(),
            description: present(body.description),
            context: body.concepts,
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmodulesRequest {
    pub module_title: Option<String>,
    pub module_description: Option<String>,
}

impl From<SubmodulesRequest> for GenerationRequest {
    fn from(body: SubmodulesRequest) -> Self {
        GenerationRequest {
            topic: body.module_title.unwrap_or_default(),
            focus_description: present(body.module_description),
            ..Default::default()
        }
    }
}

//=========================================================================================
// Concepts, Lessons and Chapters
//=========================================================================================

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConceptDetailsRequest {
    pub topic: Option<String>,
    pub concept: Option<String>,
    pub custom_language: Option<CustomLanguage>,
}

impl From<ConceptDetailsRequest> for GenerationRequest {
    fn from(body: ConceptDetailsRequest) -> Self {
        GenerationRequest {
            topic: body.topic.unwrap_or_default(),
            focus: present(body.concept),
            custom_topic: body.custom_language.and_then(CustomLanguage::into_topic),
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentRequest {
    pub module_title: Option<String>,
    pub submodule_title: Option<String>,
    pub submodule_description: Option<String>,
}

impl From<ContentRequest> for GenerationRequest {
    fn from(body: ContentRequest) -> Self {
        GenerationRequest {
            topic: body.module_title.unwrap_or_default(),
            focus: present(body.submodule_title),
            focus_description: present(body.submodule_description),
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentData {
    pub skill_gaps: Vec<String>,
}

/// Chapters for a topic or module, or the full content of one `chapter` when it is named.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TutorRequest {
    pub language: Option<String>,
    pub chapter: Option<String>,
    pub module_title: Option<String>,
    pub module_description: Option<String>,
    pub custom_language: Option<CustomLanguage>,
    pub assessment_data: Option<AssessmentData>,
}

impl TutorRequest {
    pub fn names_chapter(&self) -> bool {
        self.chapter.as_ref().is_some_and(|c| !c.trim().is_empty())
    }
}

impl From<TutorRequest> for GenerationRequest {
    fn from(body: TutorRequest) -> Self {
        let (focus, focus_description) = match present(body.chapter) {
            Some(chapter) => (Some(chapter), None),
            None => (present(body.module_title), present(body.module_description)),
        };
        GenerationRequest {
            topic: body.language.unwrap_or_default(),
            focus,
            focus_description,
            custom_topic: body.custom_language.and_then(CustomLanguage::into_topic),
            skill_gaps: body
                .assessment_data
                .map(|data| data.skill_gaps)
                .unwrap_or_default(),
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleRequest {
    pub topic: Option<String>,
}

impl From<ModuleRequest> for GenerationRequest {
    fn from(body: ModuleRequest) -> Self {
        GenerationRequest {
            topic: body.topic.unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// Numbered-list questions. `answers` may hold any JSON values; they are passed
/// to the prompt as written.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct QuickQuestionsRequest {
    pub language: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub answers: Vec<serde_json::Value>,
}

impl From<QuickQuestionsRequest> for GenerationRequest {
    fn from(body: QuickQuestionsRequest) -> Self {
        GenerationRequest {
            topic: body.language.unwrap_or_default(),
            context: body.answers.iter().map(|answer| answer.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PathwayRequest {
    pub topic: Option<String>,
}

impl From<PathwayRequest> for GenerationRequest {
    fn from(body: PathwayRequest) -> Self {
        GenerationRequest {
            topic: body.topic.unwrap_or_default(),
            ..Default::default()
        }
    }
}

//=========================================================================================
// Client State
//=========================================================================================

#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(default)]
pub struct ChapterProgressRequest {
    pub completed: bool,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub completed_chapters: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tutor_body_maps_onto_a_focused_request() {
        let body: TutorRequest = serde_json::from_value(json!({
            "language": "Rust",
            "moduleTitle": "Ownership",
            "moduleDescription": "  ",
            "assessmentData": { "skillGaps": ["Borrowing"] }
        }))
        .unwrap();

        let request = GenerationRequest::from(body);
        assert_eq!(request.topic, "Rust");
        assert_eq!(request.focus.as_deref(), Some("Ownership"));
        assert_eq!(request.focus_description, None);
        assert_eq!(request.skill_gaps, vec!["Borrowing".to_string()]);
        assert!(!request.is_custom());
    }

    #[test]
    fn a_named_chapter_takes_the_focus() {
        let body: TutorRequest = serde_json::from_value(json!({
            "language": "Rust",
            "chapter": "Closures",
            "moduleTitle": "Functions",
            "moduleDescription": "Calling and returning"
        }))
        .unwrap();
        assert!(body.names_chapter());

        let request = GenerationRequest::from(body);
        assert_eq!(request.focus.as_deref(), Some("Closures"));
        assert_eq!(request.focus_description, None);

        let blank: TutorRequest = serde_json::from_value(json!({ "language": "Rust", "chapter": " " })).unwrap();
        assert!(!blank.names_chapter());
    }

    #[test]
    fn previous_answers_are_kept_as_json_text() {
        let body: QuickQuestionsRequest = serde_json::from_value(json!({
            "language": "Python",
            "answers": ["lists are mutable", { "id": 2 }]
        }))
        .unwrap();
        let request = GenerationRequest::from(body);
        assert_eq!(
            request.context,
            vec![r#""lists are mutable""#.to_string(), r#"{"id":2}"#.to_string()]
        );
    }

    #[test]
    fn custom_language_requires_the_flag_and_a_name() {
        let flagged = CustomLanguage {
            name: " Chemistry ".into(),
            description: "Atoms".into(),
            concepts: vec!["Bonds".into()],
            is_custom: true,
        };
        assert_eq!(flagged.clone().into_topic().unwrap().name, "Chemistry");
        assert!(CustomLanguage { is_custom: false, ..flagged.clone() }.into_topic().is_none());
        assert!(CustomLanguage { name: "".into(), ..flagged }.into_topic().is_none());
    }

    #[test]
    fn missing_fields_still_deserialize() {
        let body: ModulesRequest = serde_json::from_value(json!({})).unwrap();
        let request = GenerationRequest::from(body);
        assert!(request.topic.is_empty());
        assert!(request.context.is_empty());
    }

    #[test]
    fn error_body_omits_absent_details() {
        let body = ErrorBody::new("The generation service is unavailable", None);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({ "error": "The generation service is unavailable" })
        );
    }
}

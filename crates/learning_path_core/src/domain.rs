//! crates/learning_path_core/src/domain.rs
//!
//! Defines the core request and client-state structures for the application.
//! Generated payload shapes live in `payload.rs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-authored topic, as opposed to one of the built-in languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTopic {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub concepts: Vec<String>,
}

/// A single graded answer from an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    pub skill: String,
    pub is_correct: bool,
}

/// The skills behind every incorrect answer, in answer order.
pub fn skill_gaps(answers: &[GradedAnswer]) -> Vec<String> {
    answers
        .iter()
        .filter(|answer| !answer.is_correct)
        .map(|answer| answer.skill.clone())
        .collect()
}

/// Everything a prompt template may draw on. Which fields are mandatory is
/// decided by the template, but `topic` is required by all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: String,
    pub description: Option<String>,
    /// Prior answers or key concepts, in the order the caller supplied them.
    pub context: Vec<String>,
    /// The concept, module or chapter the request narrows down to.
    pub focus: Option<String>,
    pub focus_description: Option<String>,
    pub custom_topic: Option<CustomTopic>,
    pub skill_gaps: Vec<String>,
}

impl GenerationRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    pub fn with_focus_description(mut self, description: impl Into<String>) -> Self {
        self.focus_description = Some(description.into());
        self
    }

    pub fn with_custom_topic(mut self, custom_topic: CustomTopic) -> Self {
        self.custom_topic = Some(custom_topic);
        self
    }

    pub fn with_skill_gaps(mut self, skill_gaps: Vec<String>) -> Self {
        self.skill_gaps = skill_gaps;
        self
    }

    /// Whether the topic was authored by the user rather than picked from the built-ins.
    pub fn is_custom(&self) -> bool {
        self.custom_topic.is_some()
    }
}

/// One entry of a client's learning-path history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub language: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub path: String,
}

impl HistoryEntry {
    /// Builds an entry pointing at the tutor page for `language`.
    pub fn for_tutor(language: &str, description: &str, timestamp: DateTime<Utc>) -> Self {
        let encoded: String = url::form_urlencoded::byte_serialize(language.as_bytes()).collect();
        Self {
            language: language.to_string(),
            description: description.to_string(),
            timestamp,
            path: format!("/tutor?language={}", encoded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_gaps_keep_only_incorrect_answers_in_order() {
        let answers = vec![
            GradedAnswer { skill: "Closures".into(), is_correct: false },
            GradedAnswer { skill: "Loops".into(), is_correct: true },
            GradedAnswer { skill: "Generics".into(), is_correct: false },
        ];
        assert_eq!(skill_gaps(&answers), vec!["Closures", "Generics"]);
    }

    #[test]
    fn tutor_history_path_is_url_encoded() {
        let entry = HistoryEntry::for_tutor("Organic Chemistry & Labs", "", Utc::now());
        assert_eq!(entry.path, "/tutor?language=Organic+Chemistry+%26+Labs");
    }

    #[test]
    fn custom_flag_follows_the_descriptor() {
        let request = GenerationRequest::new("Rust");
        assert!(!request.is_custom());
        let request = request.with_custom_topic(CustomTopic {
            name: "Rust".into(),
            description: "Systems programming".into(),
            concepts: vec![],
        });
        assert!(request.is_custom());
    }
}

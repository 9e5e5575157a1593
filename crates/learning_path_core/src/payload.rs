//! crates/learning_path_core/src/payload.rs
//!
//! The typed payloads a completion can be validated into. Field names follow the
//! camelCase wire format the browser client consumes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A question line: `3. ...` or `Question 3: ...`.
static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+\.|Question \d+:)\s*").expect("valid question-line pattern"));

/// A learning resource attached to a chapter, concept or learning-path step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub question: String,
    pub difficulty: String,
    pub concept: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionList {
    pub questions: Vec<Question>,
}

impl QuestionList {
    /// Familiarity options offered by self-assessment questions.
    pub const FAMILIARITY_OPTIONS: [&'static str; 5] = [
        "No knowledge",
        "Basic understanding",
        "Intermediate knowledge",
        "Advanced understanding",
        "Expert level",
    ];

    /// One "How familiar are you with ..." question per concept, built without a model call.
    pub fn self_assessment(concepts: &[String]) -> Self {
        let questions = concepts
            .iter()
            .map(|concept| concept.trim())
            .filter(|concept| !concept.is_empty())
            .enumerate()
            .map(|(index, concept)| Question {
                id: Some(Value::String(format!("custom-{}", index + 1))),
                question: format!("How familiar are you with {}?", concept),
                difficulty: "custom".to_string(),
                concept: concept.to_string(),
                options: Self::FAMILIARITY_OPTIONS
                    .iter()
                    .map(|option| option.to_string())
                    .collect(),
            })
            .collect();
        Self { questions }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub title: String,
    pub description: String,
    pub example: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub title: String,
    pub solution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub title: String,
    pub description: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,
    pub description: String,
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_principles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<Application>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<Chapter>,
}

/// The top-level modules of a learning path. Arrives as a bare JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleList {
    pub modules: Vec<Module>,
}

/// Submodules of a single module. Same shape as [`ModuleList`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmoduleList {
    pub submodules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterList {
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptDetail {
    pub title: String,
    pub definition: String,
    pub explanation: String,
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<Application>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub challenges: Vec<Challenge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGap {
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPathItem {
    pub title: String,
    pub description: String,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGapReport {
    pub skill_gap: SkillGap,
    pub learning_path: Vec<LearningPathItem>,
}

impl SkillGapReport {
    /// The report returned when an assessment shows no incorrect answers.
    pub fn no_gaps() -> Self {
        Self {
            skill_gap: SkillGap {
                title: "No significant skill gaps detected".to_string(),
                detail: "Your answers show a good understanding of the topic. Consider exploring more advanced concepts.".to_string(),
            },
            learning_path: Vec::new(),
        }
    }
}

/// Key concepts suggested for a custom topic. Arrives as comma-separated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptList {
    pub concepts: Vec<String>,
}

impl ConceptList {
    pub fn parse(text: &str) -> Self {
        let concepts = text
            .split(',')
            .map(|concept| concept.trim())
            .filter(|concept| !concept.is_empty())
            .map(str::to_string)
            .collect();
        Self { concepts }
    }
}

/// HTML lesson content for a submodule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonContent {
    pub content: String,
}

/// Questions read from a plain numbered list rather than a JSON document.
/// Difficulty follows list position: two beginner, two intermediate, then advanced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberedQuestionList {
    pub questions: Vec<Question>,
}

impl NumberedQuestionList {
    pub const CONCEPT: &'static str = "General Programming";

    pub fn parse(text: &str) -> Self {
        let questions = text
            .lines()
            .map(str::trim)
            .filter_map(|line| {
                let prefix = NUMBERED_LINE.find(line)?;
                let question = line[prefix.end()..].trim();
                (!question.is_empty()).then_some(question)
            })
            .enumerate()
            .map(|(index, question)| Question {
                id: Some(Value::from(index + 1)),
                question: question.to_string(),
                difficulty: match index {
                    0 | 1 => "beginner",
                    2 | 3 => "intermediate",
                    _ => "advanced",
                }
                .to_string(),
                concept: Self::CONCEPT.to_string(),
                options: Vec::new(),
            })
            .collect();
        Self { questions }
    }

    /// The list form the questions were read from.
    pub fn to_text(&self) -> String {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| format!("{}. {}", index + 1, question.question))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Definition, explanation and supporting material for one concept or chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptBody {
    pub definition: String,
    pub explanation: String,
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<Application>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub challenges: Vec<Challenge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

/// Full content for a single tutor chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterContent {
    pub content: ConceptBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedChapter {
    pub title: String,
    pub description: String,
    pub content: ConceptBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedModule {
    pub title: String,
    pub description: String,
    pub chapters: Vec<DetailedChapter>,
}

/// One module generated in full, every chapter carrying its content.
/// The completion is the bare module; it is served under `module`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDetail {
    pub module: DetailedModule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayTopic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_link: Option<String>,
    pub difficulty: String,
    #[serde(default)]
    pub starred: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayStep {
    pub id: String,
    pub title: String,
    pub topics: Vec<PathwayTopic>,
}

/// A stepwise study pathway: up to five steps, each a list of topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pathway {
    pub steps: Vec<PathwayStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_list_splits_and_drops_blanks() {
        let list = ConceptList::parse(" Ownership, Borrowing ,, Lifetimes,\n");
        assert_eq!(list.concepts, vec!["Ownership", "Borrowing", "Lifetimes"]);
    }

    #[test]
    fn self_assessment_builds_one_question_per_concept() {
        let list = QuestionList::self_assessment(&["Stoichiometry".into(), " ".into(), "Titration".into()]);
        assert_eq!(list.questions.len(), 2);
        assert_eq!(list.questions[1].question, "How familiar are you with Titration?");
        assert_eq!(list.questions[1].id, Some(Value::String("custom-2".into())));
        assert_eq!(list.questions[0].difficulty, "custom");
        assert_eq!(list.questions[0].options.len(), 5);
    }

    #[test]
    fn resource_kind_serializes_as_type() {
        let resource = Resource {
            title: "Book".into(),
            url: "https://example.com".into(),
            kind: "textbook".into(),
            description: None,
        };
        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["type"], "textbook");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn numbered_lines_become_questions_with_positional_difficulty() {
        let text = "Here are your questions:\n\
                    1. What is a closure?\n\
                    2.  What does `move` do?\n\
                    Question 3: Explain lifetimes.\n\
                    - not a question\n\
                    4. What is a trait object?\n\
                    5. How does `Pin` work?\n\
                    6.\n";
        let list = NumberedQuestionList::parse(text);
        let difficulties: Vec<_> = list.questions.iter().map(|q| q.difficulty.as_str()).collect();
        assert_eq!(
            difficulties,
            vec!["beginner", "beginner", "intermediate", "intermediate", "advanced"]
        );
        assert_eq!(list.questions[1].question, "What does `move` do?");
        assert_eq!(list.questions[2].question, "Explain lifetimes.");
        assert_eq!(list.questions[4].id, Some(Value::from(5)));
        assert_eq!(list.questions[0].concept, NumberedQuestionList::CONCEPT);
    }

    #[test]
    fn numbered_list_text_reads_back_the_same() {
        let list = NumberedQuestionList::parse("1. A?\n2. B?\n3. C?");
        assert_eq!(NumberedQuestionList::parse(&list.to_text()), list);
    }
}

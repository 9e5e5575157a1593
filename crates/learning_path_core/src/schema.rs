//! crates/learning_path_core/src/schema.rs
//!
//! Shape contracts for every payload variant. Each variant walks the parsed
//! document explicitly and reports the first violation with its exact path
//! (`learningPath[2].resources[0].url`), so a rejected completion can be
//! diagnosed without re-running generation.

use crate::extract::JsonShape;
use crate::payload::{
    ChapterContent, ChapterList, ConceptDetail, ConceptList, DetailedModule, LessonContent,
    ModuleDetail, ModuleList, NumberedQuestionList, Pathway, QuestionList, SkillGapReport,
    SubmoduleList,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const DIFFICULTIES: [&str; 3] = ["beginner", "intermediate", "advanced"];
const PATHWAY_DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];

//=========================================================================================
// Violations
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Missing,
    Empty,
    /// Carries the expected kind with its article, e.g. "an array".
    WrongType(&'static str),
    NotAllowed(String),
    Unreadable(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing => f.write_str("is missing"),
            Violation::Empty => f.write_str("is empty"),
            Violation::WrongType(expected) => write!(f, "is not {}", expected),
            Violation::NotAllowed(value) => write!(f, "has unsupported value '{}'", value),
            Violation::Unreadable(message) => write!(f, "could not be read: {}", message),
        }
    }
}

/// A document that parsed but does not satisfy its variant's shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path} {violation}")]
pub struct SchemaViolation {
    pub path: String,
    pub violation: Violation,
}

impl SchemaViolation {
    fn new(path: impl Into<String>, violation: Violation) -> Self {
        Self {
            path: path.into(),
            violation,
        }
    }
}

//=========================================================================================
// The Schema Trait
//=========================================================================================

/// Request-dependent knobs of validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaContext {
    /// Custom topics may tag questions with any difficulty, not just the three levels.
    pub open_difficulty: bool,
}

/// A payload variant with its own explicit validator.
pub trait Schema: Sized + Serialize + DeserializeOwned {
    /// Root name used in violation paths.
    const ROOT: &'static str;
    const SHAPE: JsonShape;

    fn validate(document: &Value, context: &SchemaContext) -> Result<(), SchemaViolation>;

    /// Converts an already validated document into the typed payload.
    fn from_document(document: Value) -> Result<Self, SchemaViolation> {
        serde_json::from_value(document)
            .map_err(|e| SchemaViolation::new(Self::ROOT, Violation::Unreadable(e.to_string())))
    }

    /// The document form of the payload, as it would appear in a completion.
    fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Validates `document` against `S` and converts it. Nothing is accepted partially.
pub fn conform<S: Schema>(document: Value, context: &SchemaContext) -> Result<S, SchemaViolation> {
    S::validate(&document, context)?;
    S::from_document(document)
}

//=========================================================================================
// Path-tracking Cursors
//=========================================================================================

struct Obj<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

struct Items<'a> {
    items: &'a [Value],
    path: String,
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

impl<'a> Obj<'a> {
    /// The document root. Member paths start bare (`questions[0]`), but a
    /// non-object root is reported under the variant's root name.
    fn root(document: &'a Value, name: &'static str) -> Result<Self, SchemaViolation> {
        match document {
            Value::Object(map) => Ok(Self {
                map,
                path: String::new(),
            }),
            _ => Err(SchemaViolation::new(name, Violation::WrongType("an object"))),
        }
    }

    fn at(value: &'a Value, path: String) -> Result<Self, SchemaViolation> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            Value::Null => Err(SchemaViolation::new(path, Violation::Missing)),
            _ => Err(SchemaViolation::new(path, Violation::WrongType("an object"))),
        }
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    fn text(&self, key: &str) -> Result<&'a str, SchemaViolation> {
        let path = child(&self.path, key);
        match self.present(key) {
            None => Err(SchemaViolation::new(path, Violation::Missing)),
            Some(Value::String(s)) if s.trim().is_empty() => {
                Err(SchemaViolation::new(path, Violation::Empty))
            }
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(SchemaViolation::new(path, Violation::WrongType("a string"))),
        }
    }

    fn optional_text(&self, key: &str) -> Result<(), SchemaViolation> {
        match self.present(key) {
            None | Some(Value::String(_)) => Ok(()),
            Some(_) => Err(SchemaViolation::new(
                child(&self.path, key),
                Violation::WrongType("a string"),
            )),
        }
    }

    fn optional_bool(&self, key: &str) -> Result<(), SchemaViolation> {
        match self.present(key) {
            None | Some(Value::Bool(_)) => Ok(()),
            Some(_) => Err(SchemaViolation::new(
                child(&self.path, key),
                Violation::WrongType("a boolean"),
            )),
        }
    }

    /// A text member whose value must be one of `allowed`, ignoring case.
    fn one_of(&self, key: &str, allowed: &[&str]) -> Result<&'a str, SchemaViolation> {
        let value = self.text(key)?;
        if allowed
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(value.trim()))
        {
            Ok(value)
        } else {
            Err(SchemaViolation::new(
                child(&self.path, key),
                Violation::NotAllowed(value.to_string()),
            ))
        }
    }

    fn object(&self, key: &str) -> Result<Obj<'a>, SchemaViolation> {
        let path = child(&self.path, key);
        match self.present(key) {
            None => Err(SchemaViolation::new(path, Violation::Missing)),
            Some(value) => Obj::at(value, path),
        }
    }

    fn array(&self, key: &str, min: usize) -> Result<Items<'a>, SchemaViolation> {
        let path = child(&self.path, key);
        match self.present(key) {
            None => Err(SchemaViolation::new(path, Violation::Missing)),
            Some(value) => Items::at(value, path, min),
        }
    }

    fn optional_array(&self, key: &str) -> Result<Option<Items<'a>>, SchemaViolation> {
        match self.present(key) {
            None => Ok(None),
            Some(value) => Items::at(value, child(&self.path, key), 0).map(Some),
        }
    }
}

impl<'a> Items<'a> {
    fn at(value: &'a Value, path: String, min: usize) -> Result<Self, SchemaViolation> {
        let Value::Array(items) = value else {
            return Err(SchemaViolation::new(path, Violation::WrongType("an array")));
        };
        if items.len() < min {
            return Err(SchemaViolation::new(path, Violation::Empty));
        }
        Ok(Self { items, path })
    }

    fn each_object(
        &self,
        mut check: impl FnMut(&Obj<'a>) -> Result<(), SchemaViolation>,
    ) -> Result<(), SchemaViolation> {
        for (index, item) in self.items.iter().enumerate() {
            let obj = Obj::at(item, format!("{}[{}]", self.path, index))?;
            check(&obj)?;
        }
        Ok(())
    }

    fn each_text(&self) -> Result<(), SchemaViolation> {
        for (index, item) in self.items.iter().enumerate() {
            let path = format!("{}[{}]", self.path, index);
            match item {
                Value::String(s) if s.trim().is_empty() => {
                    return Err(SchemaViolation::new(path, Violation::Empty))
                }
                Value::String(_) => {}
                Value::Null => return Err(SchemaViolation::new(path, Violation::Missing)),
                _ => return Err(SchemaViolation::new(path, Violation::WrongType("a string"))),
            }
        }
        Ok(())
    }
}

//=========================================================================================
// Shared Element Rules
//=========================================================================================

fn resource(obj: &Obj<'_>) -> Result<(), SchemaViolation> {
    obj.text("title")?;
    obj.text("url")?;
    obj.text("type")?;
    obj.optional_text("description")
}

fn application(obj: &Obj<'_>) -> Result<(), SchemaViolation> {
    obj.text("title")?;
    obj.text("description")?;
    obj.text("example")?;
    Ok(())
}

fn challenge(obj: &Obj<'_>) -> Result<(), SchemaViolation> {
    obj.text("title")?;
    obj.text("solution")?;
    Ok(())
}

fn exercise(obj: &Obj<'_>) -> Result<(), SchemaViolation> {
    obj.text("title")?;
    obj.text("description")?;
    obj.text("difficulty")?;
    Ok(())
}

fn chapter(obj: &Obj<'_>) -> Result<(), SchemaViolation> {
    obj.text("title")?;
    obj.text("description")?;
    obj.array("resources", 0)?.each_object(resource)?;
    if let Some(principles) = obj.optional_array("keyPrinciples")? {
        principles.each_text()?;
    }
    if let Some(applications) = obj.optional_array("applications")? {
        applications.each_object(application)?;
    }
    if let Some(exercises) = obj.optional_array("exercises")? {
        exercises.each_object(exercise)?;
    }
    Ok(())
}

fn module(obj: &Obj<'_>) -> Result<(), SchemaViolation> {
    obj.text("title")?;
    obj.text("description")?;
    if let Some(chapters) = obj.optional_array("chapters")? {
        chapters.each_object(chapter)?;
    }
    Ok(())
}

fn concept_body(obj: &Obj<'_>) -> Result<(), SchemaViolation> {
    obj.text("definition")?;
    obj.text("explanation")?;
    obj.array("keyPoints", 1)?.each_text()?;
    if let Some(applications) = obj.optional_array("applications")? {
        applications.each_object(application)?;
    }
    if let Some(challenges) = obj.optional_array("challenges")? {
        challenges.each_object(challenge)?;
    }
    if let Some(resources) = obj.optional_array("resources")? {
        resources.each_object(resource)?;
    }
    Ok(())
}

fn detailed_chapter(obj: &Obj<'_>) -> Result<(), SchemaViolation> {
    obj.text("title")?;
    obj.text("description")?;
    concept_body(&obj.object("content")?)
}

fn pathway_topic(obj: &Obj<'_>) -> Result<(), SchemaViolation> {
    obj.text("id")?;
    obj.text("title")?;
    obj.one_of("difficulty", &PATHWAY_DIFFICULTIES)?;
    obj.optional_text("articleLink")?;
    obj.optional_text("youtubeLink")?;
    obj.optional_text("practiceLink")?;
    obj.optional_bool("completed")?;
    obj.optional_bool("starred")
}

fn module_array(document: &Value, root: &'static str) -> Result<(), SchemaViolation> {
    Items::at(document, root.to_string(), 1)?.each_object(module)
}

//=========================================================================================
// Variant Validators
//=========================================================================================

impl Schema for QuestionList {
    const ROOT: &'static str = "questions";
    const SHAPE: JsonShape = JsonShape::Object;

    fn validate(document: &Value, context: &SchemaContext) -> Result<(), SchemaViolation> {
        let root = Obj::root(document, Self::ROOT)?;
        root.array("questions", 1)?.each_object(|question| {
            question.text("question")?;
            let difficulty = question.text("difficulty")?;
            if !context.open_difficulty
                && !DIFFICULTIES
                    .iter()
                    .any(|level| level.eq_ignore_ascii_case(difficulty.trim()))
            {
                return Err(SchemaViolation::new(
                    child(&question.path, "difficulty"),
                    Violation::NotAllowed(difficulty.to_string()),
                ));
            }
            question.text("concept")?;
            if let Some(options) = question.optional_array("options")? {
                options.each_text()?;
            }
            Ok(())
        })
    }
}

impl Schema for ModuleList {
    const ROOT: &'static str = "modules";
    const SHAPE: JsonShape = JsonShape::Array;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        module_array(document, Self::ROOT)
    }

    fn from_document(document: Value) -> Result<Self, SchemaViolation> {
        serde_json::from_value(document)
            .map(|modules| Self { modules })
            .map_err(|e| SchemaViolation::new(Self::ROOT, Violation::Unreadable(e.to_string())))
    }

    fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.modules)
    }
}

impl Schema for SubmoduleList {
    const ROOT: &'static str = "submodules";
    const SHAPE: JsonShape = JsonShape::Array;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        module_array(document, Self::ROOT)
    }

    fn from_document(document: Value) -> Result<Self, SchemaViolation> {
        serde_json::from_value(document)
            .map(|submodules| Self { submodules })
            .map_err(|e| SchemaViolation::new(Self::ROOT, Violation::Unreadable(e.to_string())))
    }

    fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.submodules)
    }
}

impl Schema for ChapterList {
    const ROOT: &'static str = "chapters";
    const SHAPE: JsonShape = JsonShape::Object;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        let root = Obj::root(document, Self::ROOT)?;
        root.array("chapters", 1)?.each_object(chapter)
    }
}

impl Schema for ConceptDetail {
    const ROOT: &'static str = "concept";
    const SHAPE: JsonShape = JsonShape::Object;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        let root = Obj::root(document, Self::ROOT)?;
        root.text("title")?;
        concept_body(&root)
    }
}

impl Schema for ChapterContent {
    const ROOT: &'static str = "chapter";
    const SHAPE: JsonShape = JsonShape::Object;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        let root = Obj::root(document, Self::ROOT)?;
        concept_body(&root.object("content")?)
    }
}

impl Schema for ModuleDetail {
    const ROOT: &'static str = "module";
    const SHAPE: JsonShape = JsonShape::Object;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        let root = Obj::root(document, Self::ROOT)?;
        root.text("title")?;
        root.text("description")?;
        root.array("chapters", 1)?.each_object(detailed_chapter)
    }

    fn from_document(document: Value) -> Result<Self, SchemaViolation> {
        serde_json::from_value::<DetailedModule>(document)
            .map(|module| Self { module })
            .map_err(|e| SchemaViolation::new(Self::ROOT, Violation::Unreadable(e.to_string())))
    }

    fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.module)
    }
}

impl Schema for Pathway {
    const ROOT: &'static str = "pathway";
    const SHAPE: JsonShape = JsonShape::Object;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        let root = Obj::root(document, Self::ROOT)?;
        root.array("steps", 1)?.each_object(|step| {
            step.text("id")?;
            step.text("title")?;
            step.array("topics", 1)?.each_object(pathway_topic)
        })
    }
}

impl Schema for SkillGapReport {
    const ROOT: &'static str = "report";
    const SHAPE: JsonShape = JsonShape::Object;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        let root = Obj::root(document, Self::ROOT)?;
        let gap = root.object("skillGap")?;
        gap.text("title")?;
        gap.text("detail")?;
        // An empty learning path is the legitimate "nothing to fix" answer.
        root.array("learningPath", 0)?.each_object(|item| {
            item.text("title")?;
            item.text("description")?;
            item.array("resources", 0)?.each_object(resource)
        })
    }
}

impl Schema for ConceptList {
    const ROOT: &'static str = "concepts";
    const SHAPE: JsonShape = JsonShape::Text;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        let Value::String(text) = document else {
            return Err(SchemaViolation::new(Self::ROOT, Violation::WrongType("a string")));
        };
        if ConceptList::parse(text).concepts.is_empty() {
            return Err(SchemaViolation::new(Self::ROOT, Violation::Empty));
        }
        Ok(())
    }

    fn from_document(document: Value) -> Result<Self, SchemaViolation> {
        match document {
            Value::String(text) => Ok(ConceptList::parse(&text)),
            _ => Err(SchemaViolation::new(Self::ROOT, Violation::WrongType("a string"))),
        }
    }

    fn to_document(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::String(self.concepts.join(", ")))
    }
}

impl Schema for NumberedQuestionList {
    const ROOT: &'static str = "questions";
    const SHAPE: JsonShape = JsonShape::Text;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        let Value::String(text) = document else {
            return Err(SchemaViolation::new(Self::ROOT, Violation::WrongType("a string")));
        };
        if NumberedQuestionList::parse(text).questions.is_empty() {
            return Err(SchemaViolation::new(Self::ROOT, Violation::Empty));
        }
        Ok(())
    }

    fn from_document(document: Value) -> Result<Self, SchemaViolation> {
        match document {
            Value::String(text) => Ok(NumberedQuestionList::parse(&text)),
            _ => Err(SchemaViolation::new(Self::ROOT, Violation::WrongType("a string"))),
        }
    }

    fn to_document(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::String(self.to_text()))
    }
}

impl Schema for LessonContent {
    const ROOT: &'static str = "content";
    const SHAPE: JsonShape = JsonShape::Text;

    fn validate(document: &Value, _context: &SchemaContext) -> Result<(), SchemaViolation> {
        match document {
            Value::String(text) if text.trim().is_empty() => {
                Err(SchemaViolation::new(Self::ROOT, Violation::Empty))
            }
            Value::String(_) => Ok(()),
            _ => Err(SchemaViolation::new(Self::ROOT, Violation::WrongType("a string"))),
        }
    }

    fn from_document(document: Value) -> Result<Self, SchemaViolation> {
        match document {
            Value::String(text) => Ok(Self {
                content: text.trim().to_string(),
            }),
            _ => Err(SchemaViolation::new(Self::ROOT, Violation::WrongType("a string"))),
        }
    }

    fn to_document(&self) -> Result<Value, serde_json::Error> {
        Ok(Value::String(self.content.clone()))
    }
}

//! crates/learning_path_core/src/prompt.rs
//!
//! Prompt templates. Each template names the request fields it needs, renders a
//! deterministic instruction string, and fixes the payload variant its
//! completion is validated against.

use crate::domain::GenerationRequest;
use crate::payload::{
    ChapterContent, ChapterList, ConceptDetail, ConceptList, LessonContent, ModuleDetail,
    ModuleList, NumberedQuestionList, Pathway, QuestionList, SkillGapReport, SubmoduleList,
};
use crate::schema::Schema;

/// A request field a template can mark as required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Topic,
    Description,
    Context,
    Focus,
    FocusDescription,
}

impl Field {
    /// Whether `request` carries a usable (non-blank) value for this field.
    pub fn is_present(self, request: &GenerationRequest) -> bool {
        fn filled(value: Option<&String>) -> bool {
            value.is_some_and(|v| !v.trim().is_empty())
        }
        match self {
            Field::Topic => !request.topic.trim().is_empty(),
            Field::Description => filled(request.description.as_ref()),
            Field::Context => request.context.iter().any(|item| !item.trim().is_empty()),
            Field::Focus => filled(request.focus.as_ref()),
            Field::FocusDescription => filled(request.focus_description.as_ref()),
        }
    }
}

/// A request field paired with the name the caller knows it by.
pub type RequiredField = (Field, &'static str);

pub trait PromptTemplate: Send + Sync {
    type Payload: Schema;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn required_fields(&self) -> &'static [RequiredField];

    fn render(&self, request: &GenerationRequest) -> String;
}

const JSON_ONLY: &str = "Return ONLY the JSON object, no other text or markdown.";
const JSON_ARRAY_ONLY: &str = "Return ONLY the JSON array, no other text or markdown.";

const RESOURCE_SHAPE: &str = r#"{
          "title": "Resource Name",
          "type": "Article|Video|Documentation",
          "url": "URL",
          "description": "Why this resource is helpful"
        }"#;

fn custom_line(request: &GenerationRequest) -> String {
    match &request.custom_topic {
        Some(custom) => format!("This is a custom topic about: {}\n", custom.description),
        None => String::new(),
    }
}

fn gaps_line(request: &GenerationRequest) -> String {
    if request.skill_gaps.is_empty() {
        String::new()
    } else {
        format!(
            "The student has shown gaps in: {}\n",
            request.skill_gaps.join(", ")
        )
    }
}

fn chapters_shape() -> String {
    format!(
        r#"{{
  "chapters": [
    {{
      "title": "Chapter Title",
      "description": "Detailed explanation of what this chapter covers",
      "keyPrinciples": ["principle1", "principle2"],
      "applications": [
        {{
          "title": "Application Title",
          "description": "How this is used in practice",
          "example": "Detailed example specific to the topic"
        }}
      ],
      "exercises": [
        {{
          "title": "Exercise Title",
          "description": "What to do",
          "difficulty": "Beginner|Intermediate|Advanced"
        }}
      ],
      "resources": [
        {}
      ]
    }}
  ]
}}"#,
        RESOURCE_SHAPE
    )
}

//=========================================================================================
// Assessment
//=========================================================================================

/// Five assessment questions spanning beginner to advanced.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessmentQuestions;

impl PromptTemplate for AssessmentQuestions {
    type Payload = QuestionList;

    fn name(&self) -> &'static str {
        "assessment_questions"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[(Field::Topic, "language")]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        let topic = request.topic.trim();
        let mut prompt = format!(
            "Generate 5 {topic} questions that test different skill levels from beginner to advanced.\n\
             Each question should be unique, clear and concise, test a different {topic} concept, \
             and must not include any answers or explanations.\n"
        );
        prompt.push_str(&custom_line(request));
        if let Some(custom) = &request.custom_topic {
            if !custom.concepts.is_empty() {
                prompt.push_str(&format!("Key concepts: {}\n", custom.concepts.join(", ")));
            }
        }
        if !request.context.is_empty() {
            prompt.push_str(&format!(
                "Build upon the concepts shown in these previous answers:\n{}\n",
                request
                    .context
                    .iter()
                    .enumerate()
                    .map(|(i, answer)| format!("{}. {}", i + 1, answer))
                    .collect::<Vec<_>>()
                    .join("\n")
            ));
        }
        let difficulty = if request.is_custom() {
            r#""beginner" | "intermediate" | "advanced" | "custom""#
        } else {
            r#""beginner" | "intermediate" | "advanced""#
        };
        prompt.push_str(&format!(
            r#"
Return the questions in JSON format with the following structure:
{{
  "questions": [
    {{
      "id": number,
      "question": string,
      "difficulty": {difficulty},
      "concept": string
    }}
  ]
}}

{JSON_ONLY}"#
        ));
        prompt
    }
}

/// Skill-gap analysis and a remedial learning path.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillGapAnalysis;

impl PromptTemplate for SkillGapAnalysis {
    type Payload = SkillGapReport;

    fn name(&self) -> &'static str {
        "skill_gap_analysis"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[(Field::Topic, "language")]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        let topic = request.topic.trim();
        let description = request
            .description
            .clone()
            .unwrap_or_else(|| format!("Learning {}", topic));
        let concepts = request
            .custom_topic
            .as_ref()
            .map(|custom| custom.concepts.join(", "))
            .unwrap_or_default();
        format!(
            r#"Analyse the skill gaps of a student learning "{topic}" and create a learning path that closes them.
Description: {description}
Key Concepts: {concepts}
Skill gaps identified by the assessment: {gaps}

CRITICAL RULES:
1. ALL resources MUST be directly and exclusively about "{topic}"
2. DO NOT include any programming or coding examples unless "{topic}" is explicitly about programming/software development
3. Each resource must be 100% relevant to its step's specific topic
4. Only include free, high-quality resources from reputable sources with valid URLs

Format the response as a JSON object with the following structure:
{{
  "skillGap": {{
    "title": "Short summary of the identified skill gaps",
    "detail": "A detailed description of the identified skill gaps"
  }},
  "learningPath": [
    {{
      "title": "Topic to learn",
      "description": "Brief description of what to learn",
      "resources": [
        {{
          "title": "Resource Title",
          "url": "https://example.com",
          "type": "article|video|documentation|experiment|textbook|research_paper"
        }}
      ]
    }}
  ]
}}

{JSON_ONLY}"#,
            gaps = request.skill_gaps.join(", "),
        )
    }
}

/// Five questions as a plain numbered list, optionally building on earlier answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickQuestions;

impl PromptTemplate for QuickQuestions {
    type Payload = NumberedQuestionList;

    fn name(&self) -> &'static str {
        "quick_questions"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[(Field::Topic, "language")]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        let topic = request.topic.trim();
        let last = if request.context.is_empty() {
            "Cover fundamental programming concepts"
        } else {
            "Build upon the concepts shown in the previous answers"
        };
        let basis = if request.context.is_empty() {
            String::new()
        } else {
            format!(
                " based on these previous answers: [{}]",
                request.context.join(",")
            )
        };
        format!(
            "Generate 5 {topic} programming questions{basis}. Each question should:\n\
             1. Be clear and concise\n\
             2. Test a specific programming concept\n\
             3. Be suitable for a programming assessment\n\
             4. Not include any answers or explanations\n\
             5. {last}\n\n\
             Format each question as a numbered list (1., 2., etc.)"
        )
    }
}

//=========================================================================================
// Learning Path Structure
//=========================================================================================

/// Four to six top-level modules for a topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleOutline;

impl PromptTemplate for ModuleOutline {
    type Payload = ModuleList;

    fn name(&self) -> &'static str {
        "module_outline"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[
            (Field::Topic, "topic"),
            (Field::Description, "description"),
            (Field::Context, "concepts"),
        ]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        format!(
            r#"Create a structured learning path for the topic "{topic}".
Description: {description}
Key Concepts: {concepts}

Generate 4-6 main modules that cover the essential aspects of this topic. Each module should have:
1. A clear, descriptive title
2. A brief description of what will be covered
3. A logical progression from basic to advanced concepts
4. Focus on practical applications and real-world examples
5. Include both theoretical foundations and practical skills

Format the response as a JSON array of objects with "title" and "description" fields.
Example format:
[
  {{
    "title": "Introduction to [Topic]",
    "description": "Overview of basic concepts and fundamentals..."
  }}
]

{JSON_ARRAY_ONLY}"#,
            topic = request.topic.trim(),
            description = request.description.as_deref().unwrap_or_default(),
            concepts = request.context.join(", "),
        )
    }
}

/// Five to eight submodules breaking down one module.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmoduleOutline;

impl PromptTemplate for SubmoduleOutline {
    type Payload = SubmoduleList;

    fn name(&self) -> &'static str {
        "submodule_outline"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[
            (Field::Topic, "moduleTitle"),
            (Field::FocusDescription, "moduleDescription"),
        ]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        format!(
            r#"Create detailed submodules for the module "{title}".
Module Description: {description}

Generate 5-8 submodules that break down this module into specific learning components. Each submodule should have:
1. A specific, focused title
2. A detailed description of what will be covered
3. A clear connection to the main module's objectives

Format the response as a JSON array of objects with "title" and "description" fields.
Example format:
[
  {{
    "title": "Specific Aspect of [Module]",
    "description": "Detailed explanation of this specific aspect..."
  }}
]

{JSON_ARRAY_ONLY}"#,
            title = request.topic.trim(),
            description = request.focus_description.as_deref().unwrap_or_default(),
        )
    }
}

/// Chapters for a module, for a custom topic's concepts, or for the topic as a whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChapterPlan;

impl PromptTemplate for ChapterPlan {
    type Payload = ChapterList;

    fn name(&self) -> &'static str {
        "chapter_plan"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[(Field::Topic, "language")]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        let topic = request.topic.trim();
        // The module branch needs both the title and its description.
        let module = request.focus.as_deref().filter(|_| {
            Field::Focus.is_present(request) && Field::FocusDescription.is_present(request)
        });
        let custom = request
            .custom_topic
            .as_ref()
            .filter(|custom| custom.name.trim().to_lowercase() == topic.to_lowercase());
        let intro = match (module, custom) {
            (Some(module), _) => format!(
                "Create a detailed learning path for the module \"{}\" in {}.\n\n\
                 Module Description: {}\n{}{}\n\
                 Generate 6-9 detailed chapters that dive deep into this specific module. Each chapter should:\n\
                 1. Have a clear, descriptive title that is unique and not repeated\n\
                 2. Include a detailed description of what will be covered\n\
                 3. Focus on practical applications and examples specific to the topic\n\
                 4. Build upon previous chapters in a logical progression\n\
                 5. Cover distinct aspects of the topic without overlap\n",
                module.trim(),
                topic,
                request.focus_description.as_deref().unwrap_or_default(),
                custom_line(request),
                gaps_line(request),
            ),
            (None, Some(custom)) => format!(
                "Create a comprehensive learning module for {} ({}).\n\n\
                 Focus on these key concepts: {}.\n{}",
                topic,
                custom.description,
                custom.concepts.join(", "),
                gaps_line(request),
            ),
            (None, None) => format!(
                "Create a comprehensive learning module for {}.\n{}",
                topic,
                gaps_line(request),
            ),
        };
        format!(
            r#"{intro}
IMPORTANT RULES:
1. Each chapter must cover a unique aspect of the topic
2. No two chapters should have similar or overlapping content
3. Examples and applications must be relevant to the actual topic
4. For non-programming topics, focus on domain-specific knowledge and applications
5. Avoid any programming-specific examples unless the topic is explicitly about programming

Format the response as a JSON object with this structure:
{shape}

{JSON_ONLY}"#,
            shape = chapters_shape(),
        )
    }
}

/// Full content for one chapter of a tutor session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChapterContentWriter;

impl PromptTemplate for ChapterContentWriter {
    type Payload = ChapterContent;

    fn name(&self) -> &'static str {
        "chapter_content_writer"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[(Field::Topic, "language"), (Field::Focus, "chapter")]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        format!(
            r#"Create detailed content for the chapter "{chapter}" in {topic}.
{custom}{gaps}
Generate comprehensive content that:
1. Explains the concept in detail
2. Provides practical examples and applications
3. Includes key principles and fundamentals
4. Offers exercises and challenges
5. Lists relevant resources

IMPORTANT RULES:
1. Content must be specific to the chapter topic
2. No generic programming examples unless explicitly about programming
3. Focus on domain-specific knowledge and applications
4. Ensure all examples are relevant to the actual topic
5. Provide clear, step-by-step explanations

Format the response as a JSON object with this structure:
{{
  "content": {{
    "definition": "Clear definition of the concept",
    "explanation": "Detailed explanation of the concept",
    "keyPoints": ["point1", "point2"],
    "applications": [
      {{
        "title": "Application Title",
        "description": "How this is used in practice",
        "example": "Detailed example"
      }}
    ],
    "challenges": [
      {{
        "title": "Challenge Title",
        "solution": "Detailed solution"
      }}
    ],
    "resources": [
      {resource}
    ]
  }}
}}

{JSON_ONLY}"#,
            chapter = request.focus.as_deref().unwrap_or_default().trim(),
            topic = request.topic.trim(),
            custom = custom_line(request),
            gaps = gaps_line(request),
            resource = RESOURCE_SHAPE,
        )
    }
}

/// A single module generated in full, chapter content included.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleBlueprint;

impl PromptTemplate for ModuleBlueprint {
    type Payload = ModuleDetail;

    fn name(&self) -> &'static str {
        "module_blueprint"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[(Field::Topic, "topic")]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        format!(
            r#"Create a detailed learning module about "{topic}". The module should be structured as a JSON object with the following format:
{{
  "title": "A concise and descriptive title for the module",
  "description": "A brief overview of what the module covers",
  "chapters": [
    {{
      "title": "Chapter title",
      "description": "Chapter description",
      "content": {{
        "definition": "Clear definition of the concept",
        "explanation": "Detailed explanation",
        "keyPoints": ["Key point 1", "Key point 2"],
        "applications": [
          {{
            "title": "Application title",
            "description": "Application description",
            "example": "Practical example"
          }}
        ],
        "challenges": [
          {{
            "title": "Challenge title",
            "solution": "Solution description"
          }}
        ],
        "resources": [
          {resource}
        ]
      }}
    }}
  ]
}}

{JSON_ONLY}"#,
            topic = request.topic.trim(),
            resource = RESOURCE_SHAPE,
        )
    }
}

/// Stepwise study pathway with links and a difficulty per topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathwayPlan;

impl PromptTemplate for PathwayPlan {
    type Payload = Pathway;

    fn name(&self) -> &'static str {
        "pathway_plan"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[(Field::Topic, "topic")]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        format!(
            r#"Create a detailed learning pathway for {topic} with the following structure:
- Break it down into steps (maximum 5 steps)
- Each step should have multiple topics
- For each topic include:
  - Title
  - Difficulty (Easy/Medium/Hard)
  - Resource links (article, video, practice)
Format the response as a JSON object following this structure:
{{
  "steps": [
    {{
      "id": "step-1",
      "title": "Step Title",
      "topics": [
        {{
          "id": "topic-1",
          "title": "Topic Title",
          "completed": false,
          "articleLink": "url",
          "youtubeLink": "url",
          "practiceLink": "url",
          "difficulty": "Easy|Medium|Hard",
          "starred": false
        }}
      ]
    }}
  ]
}}

{JSON_ONLY}"#,
            topic = request.topic.trim(),
        )
    }
}

//=========================================================================================
// Concepts and Lessons
//=========================================================================================

/// In-depth explanation of one concept within a topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConceptExplainer;

impl PromptTemplate for ConceptExplainer {
    type Payload = ConceptDetail;

    fn name(&self) -> &'static str {
        "concept_explainer"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[(Field::Topic, "topic"), (Field::Focus, "concept")]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        format!(
            r#"Generate detailed content about the concept "{concept}" in the context of "{topic}".
{custom}
Provide a comprehensive explanation that includes:
1. Clear definition and explanation specific to the topic
2. Key principles and fundamentals relevant to the domain
3. Real-world applications and examples from the actual field
4. Common challenges and solutions in the context of the topic
5. Practical tips and best practices for the specific field

IMPORTANT RULES:
1. Content must be specific to the topic, not generic programming
2. For non-programming topics, focus on domain-specific knowledge
3. Ensure all explanations use terminology appropriate to the field

Format the response as a JSON object with this structure:
{{
  "title": "Concept Title",
  "definition": "Clear definition of the concept in the context of the topic",
  "explanation": "Detailed explanation of the concept specific to the domain",
  "keyPoints": ["key point 1", "key point 2", "key point 3"],
  "applications": [
    {{
      "title": "Application Title",
      "description": "How this concept is applied in the field",
      "example": "Specific example or case study from the domain"
    }}
  ],
  "challenges": [
    {{
      "title": "Common Challenge",
      "solution": "How to address this challenge in the context of the topic"
    }}
  ],
  "resources": [
    {resource}
  ]
}}

{JSON_ONLY}"#,
            concept = request.focus.as_deref().unwrap_or_default().trim(),
            topic = request.topic.trim(),
            custom = custom_line(request),
            resource = RESOURCE_SHAPE,
        )
    }
}

/// Comma-separated key concepts for a user-defined topic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConceptSuggestions;

impl PromptTemplate for ConceptSuggestions {
    type Payload = ConceptList;

    fn name(&self) -> &'static str {
        "concept_suggestions"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[(Field::Topic, "name"), (Field::Description, "description")]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        format!(
            "Given the following language/framework and its description, generate a list of key concepts that someone should learn.\n\
             Return the concepts as a comma-separated list. Be concise and focus on the most important concepts.\n\
             Each concept should be 1-3 words maximum.\n\n\
             Language/Framework: {}\n\
             Description: {}\n\n\
             Return only the comma-separated list of concepts, nothing else.",
            request.topic.trim(),
            request.description.as_deref().unwrap_or_default().trim(),
        )
    }
}

/// HTML lesson content for a submodule.
#[derive(Debug, Clone, Copy, Default)]
pub struct LessonWriter;

impl PromptTemplate for LessonWriter {
    type Payload = LessonContent;

    fn name(&self) -> &'static str {
        "lesson_writer"
    }

    fn required_fields(&self) -> &'static [RequiredField] {
        &[
            (Field::Topic, "moduleTitle"),
            (Field::Focus, "submoduleTitle"),
            (Field::FocusDescription, "submoduleDescription"),
        ]
    }

    fn render(&self, request: &GenerationRequest) -> String {
        format!(
            r#"Create detailed learning content for the submodule "{submodule}" which is part of the module "{module}".
Submodule Description: {description}

Generate comprehensive learning content that includes:
1. Clear explanations of key concepts
2. Practical examples and applications
3. Important points to remember
4. Common misconceptions to avoid
5. Practical exercises or thought questions

Format the content in HTML with appropriate headings, paragraphs, and lists.
Use <h3> for main points, <p> for explanations, and <ul>/<ol> for lists.
Include <strong> for important terms and <em> for emphasis.
Return only the HTML, without markdown code fences."#,
            submodule = request.focus.as_deref().unwrap_or_default().trim(),
            module = request.topic.trim(),
            description = request.focus_description.as_deref().unwrap_or_default().trim(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CustomTopic;

    fn chemistry() -> CustomTopic {
        CustomTopic {
            name: "Organic Chemistry".into(),
            description: "Carbon compounds and reactions".into(),
            concepts: vec!["Alkanes".into(), "Isomers".into()],
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let request = GenerationRequest::new("Organic Chemistry")
            .with_custom_topic(chemistry())
            .with_context(vec!["I know alkanes".into()])
            .with_skill_gaps(vec!["Isomers".into()]);
        assert_eq!(AssessmentQuestions.render(&request), AssessmentQuestions.render(&request));
        assert_eq!(SkillGapAnalysis.render(&request), SkillGapAnalysis.render(&request));
        assert_eq!(ChapterPlan.render(&request), ChapterPlan.render(&request));
    }

    #[test]
    fn assessment_prompt_embeds_topic_answers_and_shape() {
        let request = GenerationRequest::new("Rust")
            .with_context(vec!["Ownership moves values".into(), "Borrowing".into()]);
        let prompt = AssessmentQuestions.render(&request);
        assert!(prompt.starts_with("Generate 5 Rust questions"));
        assert!(prompt.contains("1. Ownership moves values\n2. Borrowing"));
        assert!(prompt.contains(r#""difficulty": "beginner" | "intermediate" | "advanced","#));
        assert!(prompt.ends_with("Return ONLY the JSON object, no other text or markdown."));
    }

    #[test]
    fn custom_topics_allow_the_custom_difficulty_tag() {
        let request = GenerationRequest::new("Organic Chemistry").with_custom_topic(chemistry());
        let prompt = AssessmentQuestions.render(&request);
        assert!(prompt.contains(r#""custom""#));
        assert!(prompt.contains("Key concepts: Alkanes, Isomers"));
    }

    #[test]
    fn module_outline_asks_for_an_array() {
        let request = GenerationRequest::new("Physics")
            .with_description("Mechanics and waves")
            .with_context(vec!["Forces".into(), "Energy".into()]);
        let prompt = ModuleOutline.render(&request);
        assert!(prompt.contains("Key Concepts: Forces, Energy"));
        assert!(prompt.ends_with(JSON_ARRAY_ONLY));
    }

    #[test]
    fn chapter_plan_switches_on_focus_and_custom_topic() {
        let module = GenerationRequest::new("Rust")
            .with_focus("Traits")
            .with_focus_description("Shared behaviour");
        assert!(ChapterPlan.render(&module).contains("for the module \"Traits\" in Rust"));

        let custom = GenerationRequest::new("Organic Chemistry").with_custom_topic(chemistry());
        assert!(ChapterPlan
            .render(&custom)
            .contains("Focus on these key concepts: Alkanes, Isomers."));

        let plain = GenerationRequest::new("Go");
        assert!(ChapterPlan
            .render(&plain)
            .starts_with("Create a comprehensive learning module for Go."));
    }

    #[test]
    fn chapter_plan_needs_both_module_fields_for_the_module_branch() {
        let title_only = GenerationRequest::new("Rust").with_focus("Traits");
        let prompt = ChapterPlan.render(&title_only);
        assert!(!prompt.contains("for the module"));
        assert!(prompt.starts_with("Create a comprehensive learning module for Rust."));

        let blank_description = GenerationRequest::new("Rust")
            .with_focus("Traits")
            .with_focus_description("  ");
        assert!(!ChapterPlan.render(&blank_description).contains("for the module"));
    }

    #[test]
    fn chapter_plan_uses_the_custom_branch_only_for_a_matching_name() {
        let matching = GenerationRequest::new("organic CHEMISTRY").with_custom_topic(chemistry());
        assert!(ChapterPlan
            .render(&matching)
            .starts_with("Create a comprehensive learning module for organic CHEMISTRY (Carbon compounds and reactions)."));

        let other = GenerationRequest::new("Rust").with_custom_topic(chemistry());
        let prompt = ChapterPlan.render(&other);
        assert!(prompt.starts_with("Create a comprehensive learning module for Rust.\n"));
        assert!(!prompt.contains("Alkanes"));
    }

    #[test]
    fn chapter_content_writer_asks_for_a_content_object() {
        let request = GenerationRequest::new("Rust")
            .with_focus("Closures")
            .with_skill_gaps(vec!["Lifetimes".into()]);
        assert_eq!(
            ChapterContentWriter.required_fields(),
            &[(Field::Topic, "language"), (Field::Focus, "chapter")]
        );
        let prompt = ChapterContentWriter.render(&request);
        assert!(prompt.starts_with("Create detailed content for the chapter \"Closures\" in Rust."));
        assert!(prompt.contains("The student has shown gaps in: Lifetimes"));
        assert!(prompt.contains(r#""content": {"#));
        assert!(prompt.ends_with(JSON_ONLY));
    }

    #[test]
    fn module_blueprint_nests_content_in_each_chapter() {
        let prompt = ModuleBlueprint.render(&GenerationRequest::new("Graph Theory"));
        assert!(prompt.starts_with("Create a detailed learning module about \"Graph Theory\"."));
        assert!(prompt.contains(r#""content": {"#));
        assert!(prompt.ends_with(JSON_ONLY));
    }

    #[test]
    fn quick_questions_mention_previous_answers_only_when_given() {
        let fresh = QuickQuestions.render(&GenerationRequest::new("Python"));
        assert!(fresh.starts_with("Generate 5 Python programming questions. Each question should:"));
        assert!(fresh.contains("5. Cover fundamental programming concepts"));
        assert!(fresh.ends_with("Format each question as a numbered list (1., 2., etc.)"));

        let answers = GenerationRequest::new("Python")
            .with_context(vec![r#""lists are mutable""#.into(), r#"{"id":2}"#.into()]);
        let prompt = QuickQuestions.render(&answers);
        assert!(prompt.contains(r#"based on these previous answers: ["lists are mutable",{"id":2}]."#));
        assert!(prompt.contains("5. Build upon the concepts shown in the previous answers"));
    }

    #[test]
    fn pathway_plan_limits_steps_and_names_difficulties() {
        let prompt = PathwayPlan.render(&GenerationRequest::new("SQL"));
        assert!(prompt.starts_with("Create a detailed learning pathway for SQL"));
        assert!(prompt.contains("maximum 5 steps"));
        assert!(prompt.contains(r#""difficulty": "Easy|Medium|Hard""#));
    }

    #[test]
    fn required_fields_are_checked_after_trimming() {
        let request = GenerationRequest::new("  ").with_description(" ");
        assert!(!Field::Topic.is_present(&request));
        assert!(!Field::Description.is_present(&request));
        assert!(!Field::Context.is_present(&request.clone().with_context(vec![" ".into()])));
        assert!(Field::Context.is_present(&request.with_context(vec!["Atoms".into()])));
    }
}

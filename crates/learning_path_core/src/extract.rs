//! crates/learning_path_core/src/extract.rs
//!
//! Locates the JSON document embedded in a free-text model completion.

use std::fmt;
use std::str::FromStr;

/// The top-level shape a payload is expected to have in the completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
    /// The completion itself is the payload; nothing is extracted.
    Text,
}

impl JsonShape {
    fn delimiters(self) -> Option<(char, char)> {
        match self {
            JsonShape::Object => Some(('{', '}')),
            JsonShape::Array => Some(('[', ']')),
            JsonShape::Text => None,
        }
    }
}

impl fmt::Display for JsonShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonShape::Object => f.write_str("object"),
            JsonShape::Array => f.write_str("array"),
            JsonShape::Text => f.write_str("text"),
        }
    }
}

/// How the span of the embedded document is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    /// First opening delimiter to the last closing delimiter, whatever lies between.
    Greedy,
    /// Stops at the delimiter that closes the first opener, skipping string literals.
    #[default]
    Balanced,
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(ExtractionMode::Greedy),
            "balanced" => Ok(ExtractionMode::Balanced),
            other => Err(format!("'{}' is not an extraction mode (balanced|greedy)", other)),
        }
    }
}

/// Returns the candidate JSON span of `text`, or `None` when no opener/closer
/// pair of the expected kind exists. `JsonShape::Text` returns the whole text.
pub fn extract_document(text: &str, shape: JsonShape, mode: ExtractionMode) -> Option<&str> {
    let Some((open, close)) = shape.delimiters() else {
        return Some(text);
    };
    match mode {
        ExtractionMode::Greedy => greedy_span(text, open, close),
        // An opener that never closes still falls back to the greedy span, so a
        // present pair is always handed to the parser.
        ExtractionMode::Balanced => {
            balanced_span(text, open).or_else(|| greedy_span(text, open, close))
        }
    }
}

fn greedy_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn balanced_span(text: &str, open: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_objects_greedy_swallows_the_junk_between() {
        let text = r#"{"a":1} junk {"b":2}"#;
        assert_eq!(
            extract_document(text, JsonShape::Object, ExtractionMode::Greedy),
            Some(text)
        );
    }

    #[test]
    fn two_objects_balanced_stops_at_the_first() {
        let text = r#"{"a":1} junk {"b":2}"#;
        assert_eq!(
            extract_document(text, JsonShape::Object, ExtractionMode::Balanced),
            Some(r#"{"a":1}"#)
        );
    }

    #[test]
    fn prose_and_code_fences_are_stripped() {
        let text = "Sure! Here you go:\n```json\n{\"questions\": []}\n```\nGood luck.";
        for mode in [ExtractionMode::Greedy, ExtractionMode::Balanced] {
            assert_eq!(
                extract_document(text, JsonShape::Object, mode),
                Some("{\"questions\": []}")
            );
        }
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_span() {
        let text = r#"Result: {"title": "Use } and { freely", "nested": {"ok": "\"}\""}} trailing }"#;
        assert_eq!(
            extract_document(text, JsonShape::Object, ExtractionMode::Balanced),
            Some(r#"{"title": "Use } and { freely", "nested": {"ok": "\"}\""}}"#)
        );
    }

    #[test]
    fn array_shape_looks_for_brackets() {
        let text = r#"Modules: [{"title": "Intro", "description": "Basics"}] (4 more soon)"#;
        assert_eq!(
            extract_document(text, JsonShape::Array, ExtractionMode::Balanced),
            Some(r#"[{"title": "Intro", "description": "Basics"}]"#)
        );
    }

    #[test]
    fn missing_pair_yields_none() {
        for mode in [ExtractionMode::Greedy, ExtractionMode::Balanced] {
            assert_eq!(extract_document("no json here", JsonShape::Object, mode), None);
            assert_eq!(extract_document("only an opener {", JsonShape::Object, mode), None);
            assert_eq!(extract_document("} backwards {", JsonShape::Object, mode), None);
            assert_eq!(extract_document(r#"{"a": 1}"#, JsonShape::Array, mode), None);
        }
    }

    #[test]
    fn unterminated_balanced_scan_falls_back_to_greedy() {
        let text = r#"{"x": "}"#;
        assert_eq!(
            extract_document(text, JsonShape::Object, ExtractionMode::Balanced),
            Some(text)
        );
    }

    #[test]
    fn text_shape_returns_everything() {
        assert_eq!(
            extract_document("a, b, c", JsonShape::Text, ExtractionMode::Balanced),
            Some("a, b, c")
        );
    }

    #[test]
    fn extraction_mode_parses_case_insensitively() {
        assert_eq!("Greedy".parse::<ExtractionMode>(), Ok(ExtractionMode::Greedy));
        assert_eq!(" balanced ".parse::<ExtractionMode>(), Ok(ExtractionMode::Balanced));
        assert!("lazy".parse::<ExtractionMode>().is_err());
    }
}

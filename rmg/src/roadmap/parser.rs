//! Clarification question parsing
//!
//! Model output is not guaranteed to be clean JSON. Parsing is
//! strict-then-lenient: the whole text first, then an isolated candidate
//! region (fenced block, then the first balanced `{...}`), then the fixed
//! fallback set. It never fails.

use thiserror::Error;
use tracing::{debug, warn};

use super::clarifications::{ClarificationQuestions, fallback_questions};

/// Why one parse attempt failed; logged, never returned to callers
#[derive(Debug, Error)]
enum QuestionParseError {
    #[error("not a JSON object of text values: {0}")]
    Json(#[from] serde_json::Error),

    #[error("object has no entries")]
    Empty,
}

/// Extract a key -> question mapping from model text
///
/// Always returns a usable mapping: the fallback questions when nothing parses.
/// An empty object is not usable, so `{}` (fenced or bare) also yields the fallback.
pub fn parse_question_mapping(text: &str) -> ClarificationQuestions {
    debug!(text_len = text.len(), "parse_question_mapping: called");

    match try_parse(text.trim()) {
        Ok(questions) => {
            debug!(count = questions.len(), "parse_question_mapping: strict parse succeeded");
            return questions;
        }
        Err(e) => debug!(error = %e, "parse_question_mapping: strict parse failed"),
    }

    for (source, candidate) in [("fenced", extract_fenced_block(text)), ("braces", extract_json_object(text))] {
        let Some(candidate) = candidate else {
            debug!(source, "parse_question_mapping: no candidate region");
            continue;
        };
        match try_parse(candidate) {
            Ok(questions) => {
                debug!(source, count = questions.len(), "parse_question_mapping: lenient parse succeeded");
                return questions;
            }
            Err(e) => debug!(source, error = %e, "parse_question_mapping: lenient parse failed"),
        }
    }

    warn!("Could not parse clarification questions from model output, using fallback questions");
    fallback_questions()
}

fn try_parse(candidate: &str) -> Result<ClarificationQuestions, QuestionParseError> {
    let questions: ClarificationQuestions = serde_json::from_str(candidate)?;
    if questions.is_empty() {
        return Err(QuestionParseError::Empty);
    }
    Ok(questions)
}

/// Content of the first ``` fenced block, with any language tag dropped
fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let content_start = after_fence.find('\n').map(|nl| nl + 1)?;
    let content = &after_fence[content_start..];
    let end = content.find("```")?;
    Some(content[..end].trim())
}

/// First balanced top-level `{...}` region, ignoring braces inside strings
fn extract_json_object(text: &str) -> Option<&str> {
    let mut depth: u32 = 0;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escape = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &text[s..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}

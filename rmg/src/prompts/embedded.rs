//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Initial roadmap generation prompt
pub const ROADMAP: &str = include_str!("../../prompts/roadmap.pmt");

/// Critique-and-rewrite prompt, with optional clarification answers
pub const REFLECT: &str = include_str!("../../prompts/reflect.pmt");

/// Clarification question proposal prompt
pub const QUESTIONS: &str = include_str!("../../prompts/questions.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "roadmap" => Some(ROADMAP),
        "reflect" => Some(REFLECT),
        "questions" => Some(QUESTIONS),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

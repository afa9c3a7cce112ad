//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the roadmap passes.
//!
//! Template loading chain:
//! 1. `{prompts-dir}/{name}.pmt` (configured override)
//! 2. `.roadmapgen/prompts/{name}.pmt` (project-local)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution. Values are
//! inserted verbatim; nothing is escaped.

pub mod embedded;
mod loader;

pub use loader::{AnswerLine, PromptContext, PromptKind, PromptLoader};

//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::embedded;
use crate::roadmap::ClarificationAnswers;

/// The three prompts of a roadmap run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// First pass: write the draft roadmap
    Roadmap,
    /// Second pass: critique and rewrite the draft
    Reflect,
    /// Ask the model for clarification questions about the draft
    Questions,
}

impl PromptKind {
    /// Get the template name for this prompt
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Roadmap => "roadmap",
            Self::Reflect => "reflect",
            Self::Questions => "questions",
        }
    }
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template_name())
    }
}

/// One rendered `- key: value` answer line
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AnswerLine {
    pub key: String,
    pub value: String,
}

/// Context for rendering prompt templates
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    /// The app idea, verbatim
    pub idea: String,
    /// Draft roadmap (reflect and questions prompts)
    pub draft: Option<String>,
    /// Clarification answers in insertion order
    pub answers: Vec<AnswerLine>,
    /// Whether the answers section is rendered
    pub has_answers: bool,
}

impl PromptContext {
    /// Create a context for the initial roadmap prompt
    pub fn initial(idea: &str) -> Self {
        debug!(idea_len = idea.len(), "PromptContext::initial: called");
        Self {
            idea: idea.to_string(),
            draft: None,
            answers: Vec::new(),
            has_answers: false,
        }
    }

    /// Create a context for the reflection prompt
    ///
    /// Empty answers render exactly like no answers.
    pub fn reflection(idea: &str, draft: &str, answers: Option<&ClarificationAnswers>) -> Self {
        let answers: Vec<AnswerLine> = answers
            .map(|a| {
                a.iter()
                    .map(|(key, value)| AnswerLine {
                        key: key.to_string(),
                        value: value.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        debug!(
            idea_len = idea.len(),
            draft_len = draft.len(),
            answer_count = answers.len(),
            "PromptContext::reflection: called"
        );
        Self {
            idea: idea.to_string(),
            draft: Some(draft.to_string()),
            has_answers: !answers.is_empty(),
            answers,
        }
    }

    /// Create a context for the clarification questions prompt
    pub fn questions(idea: &str, draft: &str) -> Self {
        debug!(idea_len = idea.len(), draft_len = draft.len(), "PromptContext::questions: called");
        Self {
            idea: idea.to_string(),
            draft: Some(draft.to_string()),
            answers: Vec::new(),
            has_answers: false,
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine (HTML escaping disabled)
    hbs: Handlebars<'static>,
    /// Configured override directory (`prompts-dir`)
    override_dir: Option<PathBuf>,
    /// Project-local directory (`.roadmapgen/prompts/`)
    local_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a new prompt loader rooted at the given directory
    ///
    /// Looks for `.roadmapgen/prompts/` under `base`.
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let local_dir = base.join(".roadmapgen/prompts");
        let local_dir_exists = local_dir.is_dir();
        debug!(?local_dir, %local_dir_exists, "PromptLoader::new: called");

        Self {
            hbs: engine(),
            override_dir: None,
            local_dir: local_dir_exists.then_some(local_dir),
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: engine(),
            override_dir: None,
            local_dir: None,
        }
    }

    /// Check `dir` before every other location
    pub fn with_override_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if dir.is_dir() {
            debug!(?dir, "PromptLoader::with_override_dir: using override directory");
            self.override_dir = Some(dir);
        } else {
            warn!("Prompt override directory {} does not exist, ignoring", dir.display());
        }
        self
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Configured override: `{prompts-dir}/{name}.pmt`
    /// 2. Project-local: `.roadmapgen/prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in [&self.override_dir, &self.local_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found on disk");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, kind: PromptKind, context: &PromptContext) -> Result<String> {
        let template_name = kind.template_name();
        let template = self.load_template(template_name)?;
        info!(
            "Rendering template '{}' (answers: {})",
            template_name,
            context.answers.len()
        );

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Prompt for the first draft of a roadmap
    pub fn initial_prompt(&self, idea: &str) -> Result<String> {
        self.render(PromptKind::Roadmap, &PromptContext::initial(idea))
    }

    /// Prompt asking the model to critique and rewrite `draft`
    pub fn reflection_prompt(&self, idea: &str, draft: &str, answers: Option<&ClarificationAnswers>) -> Result<String> {
        self.render(PromptKind::Reflect, &PromptContext::reflection(idea, draft, answers))
    }

    /// Prompt asking the model for clarification questions about `draft`
    pub fn questions_prompt(&self, idea: &str, draft: &str) -> Result<String> {
        self.render(PromptKind::Questions, &PromptContext::questions(idea, draft))
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

/// Handlebars without HTML escaping: prompts carry the idea text untouched
fn engine() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(handlebars::no_escape);
    hbs
}

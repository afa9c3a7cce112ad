//! Roadmap generator - the draft/reflect pipeline
//!
//! Every operation is a short, strictly sequential chain of model calls. The
//! reflection call needs the draft's text, so it never starts before the
//! draft call returns. Model errors propagate unchanged; there is no partial
//! result and no substitute text.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::clarifications::{ClarificationAnswers, ClarificationQuestions};
use super::parser::parse_question_mapping;
use super::progress::{Phase, ProgressObserver};
use crate::config::LlmConfig;
use crate::llm::{GenerationRequest, GenerationResponse, LlmClient, LlmError, StopReason};
use crate::prompts::PromptLoader;

/// Errors from a roadmap run
#[derive(Debug, Error)]
pub enum RoadmapError {
    /// Model call failed; the gateway error is passed through untouched
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Failed to build prompt: {0}")]
    Prompt(String),
}

impl RoadmapError {
    /// The underlying gateway error, if this came from a model call
    pub fn as_llm(&self) -> Option<&LlmError> {
        match self {
            RoadmapError::Llm(e) => Some(e),
            RoadmapError::Prompt(_) => None,
        }
    }
}

/// Model id and token budget sent with every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
}

impl GenerationSettings {
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
        }
    }
}

impl From<&LlmConfig> for GenerationSettings {
    fn from(config: &LlmConfig) -> Self {
        Self::new(config.model.clone(), config.max_tokens)
    }
}

/// Sequences model calls to draft, reflect on, and refine a roadmap
pub struct RoadmapGenerator {
    llm: Arc<dyn LlmClient>,
    settings: GenerationSettings,
    prompts: PromptLoader,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl RoadmapGenerator {
    /// Create a generator using the embedded prompts and no observer
    pub fn new(llm: Arc<dyn LlmClient>, settings: GenerationSettings) -> Self {
        debug!(model = %settings.model, max_tokens = settings.max_tokens, "RoadmapGenerator::new: called");
        Self {
            llm,
            settings,
            prompts: PromptLoader::embedded_only(),
            observer: None,
        }
    }

    /// Use a specific prompt loader (for template overrides)
    pub fn with_prompts(mut self, prompts: PromptLoader) -> Self {
        self.prompts = prompts;
        self
    }

    /// Report phase transitions to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Draft a roadmap, then reflect on it; returns the revised document
    ///
    /// Exactly two model calls.
    pub async fn generate_roadmap(&self, idea: &str) -> Result<String, RoadmapError> {
        info!(idea_len = idea.len(), "Generating roadmap");
        let draft = self.draft(idea).await?;
        self.refine(idea, &draft, None).await
    }

    /// Like [`generate_roadmap`](Self::generate_roadmap), steering the reflection with `answers`
    pub async fn generate_roadmap_with_answers(
        &self,
        idea: &str,
        answers: &ClarificationAnswers,
    ) -> Result<String, RoadmapError> {
        info!(idea_len = idea.len(), answer_count = answers.len(), "Generating roadmap with answers");
        let draft = self.draft(idea).await?;
        self.refine(idea, &draft, Some(answers)).await
    }

    /// Reflect on an existing draft and finish the run
    pub async fn refine(
        &self,
        idea: &str,
        draft: &str,
        answers: Option<&ClarificationAnswers>,
    ) -> Result<String, RoadmapError> {
        let roadmap = self.reflect(idea, draft, answers).await?;
        self.notify(Phase::Complete);
        Ok(roadmap)
    }

    /// First pass: generate the draft roadmap
    pub async fn draft(&self, idea: &str) -> Result<String, RoadmapError> {
        debug!("draft: called");
        let prompt = self.prompts.initial_prompt(idea).map_err(prompt_error)?;
        self.notify(Phase::GeneratingDraft);
        let response = self.complete("draft", prompt).await?;
        Ok(response.text)
    }

    /// Second pass: critique and rewrite `draft`, optionally using `answers`
    pub async fn reflect(
        &self,
        idea: &str,
        draft: &str,
        answers: Option<&ClarificationAnswers>,
    ) -> Result<String, RoadmapError> {
        debug!(has_answers = answers.is_some_and(|a| !a.is_empty()), "reflect: called");
        let prompt = self
            .prompts
            .reflection_prompt(idea, draft, answers)
            .map_err(prompt_error)?;
        self.notify(Phase::Reflecting);
        let response = self.complete("reflect", prompt).await?;
        Ok(response.text)
    }

    /// Ask the model for clarification questions about `draft`
    ///
    /// Unparseable output yields the fallback questions; model errors propagate.
    pub async fn propose_questions(&self, idea: &str, draft: &str) -> Result<ClarificationQuestions, RoadmapError> {
        debug!("propose_questions: called");
        let prompt = self.prompts.questions_prompt(idea, draft).map_err(prompt_error)?;
        self.notify(Phase::ProposingQuestions);
        let response = self.complete("questions", prompt).await?;
        let questions = parse_question_mapping(&response.text);
        info!(count = questions.len(), "Proposed clarification questions");
        Ok(questions)
    }

    async fn complete(&self, phase: &str, prompt: String) -> Result<GenerationResponse, LlmError> {
        let request = GenerationRequest::new(prompt, self.settings.model.clone(), self.settings.max_tokens);
        debug!(%phase, prompt_len = request.prompt.len(), "complete: sending request");

        let response = self.llm.complete(request).await?;

        info!(
            %phase,
            stop_reason = %response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            cost_usd = response.usage.cost_usd(&self.settings.model),
            "Model call finished"
        );
        if response.stop_reason == StopReason::MaxTokens {
            warn!(
                %phase,
                max_tokens = self.settings.max_tokens,
                "Response hit the token limit and may be truncated"
            );
        }
        Ok(response)
    }

    /// Tell the observer about `phase`; an observer error or panic never aborts the run
    fn notify(&self, phase: Phase) {
        info!("{}", phase.label());
        let Some(ref observer) = self.observer else {
            return;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| observer.on_phase(phase))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(?phase, error = %e, "Progress observer failed, continuing"),
            Err(_) => warn!(?phase, "Progress observer panicked, continuing"),
        }
    }
}

fn prompt_error(e: eyre::Report) -> RoadmapError {
    RoadmapError::Prompt(e.to_string())
}

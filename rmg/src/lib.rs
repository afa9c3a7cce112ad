//! RoadmapGen - two-pass LLM roadmap generator
//!
//! Turns a one-line application idea into a long markdown development
//! roadmap. The model writes a draft, then critiques and rewrites its own
//! draft in a second, independent call. Clarifying answers from the user can
//! steer the second pass.
//!
//! # Modules
//!
//! - [`llm`] - Model gateway trait and Anthropic implementation
//! - [`prompts`] - Handlebars prompt templates and rendering
//! - [`roadmap`] - Draft/reflect orchestration, progress, question parsing
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod prompts;
pub mod roadmap;

pub use config::{Config, LlmConfig};
pub use llm::{LlmClient, LlmError, create_client};
pub use prompts::PromptLoader;
pub use roadmap::{
    ClarificationAnswers, ClarificationQuestions, GenerationSettings, Phase, ProgressObserver, RoadmapError,
    RoadmapGenerator,
};

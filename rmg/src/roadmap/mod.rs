//! Roadmap pipeline
//!
//! Draft -> reflect, optionally steered by clarification answers, plus
//! clarification question proposal and parsing.

mod clarifications;
mod generator;
mod parser;
mod progress;

pub use clarifications::{
    ClarificationAnswers, ClarificationQuestions, Clarifications, FALLBACK_QUESTION_KEYS, fallback_questions,
};
pub use generator::{GenerationSettings, RoadmapError, RoadmapGenerator};
pub use parser::parse_question_mapping;
pub use progress::{CallbackObserver, ChannelObserver, Phase, ProgressObserver};

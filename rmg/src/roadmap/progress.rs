//! Progress reporting
//!
//! The generator announces each phase to an observer right before the model
//! call that phase makes. Observers must not block; their errors and panics
//! are logged and otherwise ignored.

use tokio::sync::mpsc;
use tracing::debug;

/// Phases of a roadmap run, in the order they occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// About to request the first draft
    GeneratingDraft,
    /// About to request the critique-and-rewrite pass
    Reflecting,
    /// About to request clarification questions
    ProposingQuestions,
    /// Final document produced
    Complete,
}

impl Phase {
    /// Human-readable status line
    pub fn label(&self) -> &'static str {
        match self {
            Self::GeneratingDraft => "STEP 1/2: Generating initial roadmap draft...",
            Self::Reflecting => "STEP 2/2: REFLECTION IN PROGRESS - Analyzing and improving the roadmap...",
            Self::ProposingQuestions => "Proposing clarification questions about the draft...",
            Self::Complete => "Roadmap generation complete!",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Receives phase transitions from the generator
pub trait ProgressObserver: Send + Sync {
    fn on_phase(&self, phase: Phase) -> eyre::Result<()>;
}

/// Observer backed by a closure
pub struct CallbackObserver<F> {
    callback: F,
}

impl<F> CallbackObserver<F>
where
    F: Fn(Phase) -> eyre::Result<()> + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressObserver for CallbackObserver<F>
where
    F: Fn(Phase) -> eyre::Result<()> + Send + Sync,
{
    fn on_phase(&self, phase: Phase) -> eyre::Result<()> {
        (self.callback)(phase)
    }
}

/// Observer that forwards phases into an unbounded channel
///
/// Sending never blocks. Once the receiver is dropped every notification
/// fails, which the generator logs and ignores.
#[derive(Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<Phase>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Phase>) {
        debug!("ChannelObserver::channel: called");
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_phase(&self, phase: Phase) -> eyre::Result<()> {
        self.tx
            .send(phase)
            .map_err(|_| eyre::eyre!("progress receiver dropped before {:?}", phase))
    }
}

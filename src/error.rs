use thiserror::Error;

/// Failure surfaced by stepping a network.
///
/// A step that returns one of these has committed nothing: queued graph
/// mutations and pending latch writes are discarded with the round, so the
/// state from before the step stays authoritative and the same batch can be
/// re-issued once the host problem is repaired.
#[derive(Error, Debug)]
pub enum StepError {
    /// A host effect invoked from an evaluation rule failed.
    #[error("host effect failed: {0}")]
    Effect(String),
    /// A rule demanded its own value within the round it was being computed
    /// for, which can only happen for definitions that recurse without an
    /// intervening latch.
    #[error("ill-founded recursion: `{name}` demanded its own value this round")]
    IllFounded { name: &'static str },
}

impl StepError {
    /// Wrap any displayable host error as an effect failure.
    pub fn effect(err: impl std::fmt::Display) -> Self {
        StepError::Effect(err.to_string())
    }
}

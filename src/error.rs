use thiserror::Error;

/// Typed failures raised by the relay core
///
/// Synthesis failures of individual utterances are *not* represented here:
/// they are carried as unsuccessful `SynthesisResult`s.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RelayError {
    #[error("sequence id {id} deposited twice")]
    DuplicateSequence { id: u64 },

    #[error("sequence id {id} deposited after release (next expected {next})")]
    StaleSequence { id: u64, next: u64 },

    #[error("session is stopped")]
    SessionStopped,

    #[error("invalid timeline clip: {0}")]
    InvalidTimeline(String),
}

impl RelayError {
    /// Whether this error means the reorder invariants no longer hold
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSequence { .. } | Self::StaleSequence { .. }
        )
    }
}

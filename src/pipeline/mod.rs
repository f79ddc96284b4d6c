//! Live translation pipeline
//!
//! This module provides the per-session machinery that turns finalized
//! recognition results into an ordered, paced audio stream:
//! - Sequence allocation in arrival order
//! - Parallel synthesis through a bounded worker pool
//! - Reordering and pacing of completed clips
//! - Quality/latency metrics for every released clip

mod config;
mod scheduler;
mod sequence;
mod session;
mod stats;
mod types;

pub use config::SessionConfig;
pub use scheduler::{PlaybackScheduler, ReorderBuffer, SchedulerConfig, SchedulerHandle};
pub use sequence::SequenceAllocator;
pub use session::{RecognitionEvent, TranslationSession};
pub use stats::SessionStats;
pub use types::{
    Metrics, PlaybackItem, SessionEvent, SynthesisResult, TranslationItem, Utterance,
};

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod nats;
pub mod pipeline;
pub mod synthesis;
pub mod timeline;

pub use config::Config;
pub use error::RelayError;
pub use http::{create_router, AppState};
pub use metrics::{MetricsAggregator, QualityEstimator};
pub use nats::{NatsClient, NatsSynthesizer};
pub use pipeline::{
    Metrics, PlaybackItem, RecognitionEvent, SequenceAllocator, SessionConfig, SessionEvent,
    SessionStats, SynthesisResult, TranslationSession, Utterance,
};
pub use synthesis::{SilentSynthesizer, SpeechSynthesizer, SynthesisWorkerPool, VoiceParams};
pub use timeline::{run_batch, DubSegment, TimelineAssembler, TimelineClip};

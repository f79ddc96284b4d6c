pub mod backend;
pub mod format;
pub mod pool;
pub mod voice;

pub use backend::{SilentSynthesizer, SpeechSynthesizer, SynthesisRequest};
pub use format::{decode_pcm, encode_pcm, AudioFormat};
pub use pool::{SynthesisWorkerPool, MAX_STABLE_POOL_SIZE};
pub use voice::{density_adjusted_rate, VoiceParams, VoiceStyle};

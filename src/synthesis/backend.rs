use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::format::{encode_pcm, AudioFormat};
use super::voice::VoiceParams;

/// One call to the external speech synthesis service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Plain text being spoken
    pub text: String,
    /// Voice identity and prosody
    pub voice: VoiceParams,
    /// SSML document built from `text` and `voice`
    pub ssml: String,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: VoiceParams) -> Self {
        let text = text.into();
        let ssml = voice.to_ssml(&text);
        Self { text, voice, ssml }
    }
}

/// Speech synthesis backend trait
///
/// Implementations:
/// - NATS request/reply against a TTS service (`nats::NatsSynthesizer`)
/// - Silence generator (offline dry runs and tests)
///
/// Implementations may be slow and may fail; the worker pool turns every
/// error into a failed `SynthesisResult`.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize the request, returning audio in `format()`
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>>;

    /// Sample layout of the returned audio
    fn format(&self) -> AudioFormat {
        AudioFormat::default()
    }

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Produces silence roughly as long as the text would take to speak
#[derive(Debug, Clone)]
pub struct SilentSynthesizer {
    format: AudioFormat,
    chars_per_second: f64,
}

impl SilentSynthesizer {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            chars_per_second: 15.0,
        }
    }

    /// Duration of silence generated for `text`
    pub fn spoken_secs(&self, text: &str) -> f64 {
        (text.chars().count() as f64 / self.chars_per_second).max(0.3)
    }
}

impl Default for SilentSynthesizer {
    fn default() -> Self {
        Self::new(AudioFormat::default())
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        if request.text.trim().is_empty() {
            bail!("Nothing to synthesize");
        }

        let frames = (self.spoken_secs(&request.text) * self.format.sample_rate as f64) as usize;
        let samples = vec![0i16; frames * self.format.channels as usize];
        Ok(encode_pcm(&samples))
    }

    fn format(&self) -> AudioFormat {
        self.format
    }

    fn name(&self) -> &str {
        "silent"
    }
}

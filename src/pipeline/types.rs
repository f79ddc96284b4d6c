use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One finalized recognized-and-translated unit of speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    /// Position in the session's output order
    pub sequence_id: u64,

    /// Recognized text in the source language
    pub source_text: String,

    /// Translation into the primary target language
    pub translated_text: String,

    /// Recognizer confidence (0.0 to 1.0), if reported
    pub reported_confidence: Option<f64>,

    /// Target language of `translated_text`
    pub language_code: String,

    /// When the recognizer delivered this utterance
    pub received_at: DateTime<Utc>,
}

/// Outcome of synthesizing one utterance
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub sequence_id: u64,

    /// Synthesized audio; `None` on failure
    pub audio: Option<Vec<u8>>,

    /// Playback duration derived from the audio byte length (seconds)
    pub duration_estimate: f64,

    pub success: bool,

    pub synthesized_at: DateTime<Utc>,

    /// Wall-clock time spent in the synthesis call (milliseconds)
    pub latency_ms: f64,

    /// The utterance this result was synthesized from
    pub utterance: Utterance,
}

impl SynthesisResult {
    pub fn succeeded(
        utterance: Utterance,
        audio: Vec<u8>,
        duration_estimate: f64,
        latency_ms: f64,
    ) -> Self {
        Self {
            sequence_id: utterance.sequence_id,
            audio: Some(audio),
            duration_estimate,
            success: true,
            synthesized_at: Utc::now(),
            latency_ms,
            utterance,
        }
    }

    pub fn failed(utterance: Utterance) -> Self {
        Self {
            sequence_id: utterance.sequence_id,
            audio: None,
            duration_estimate: 0.0,
            success: false,
            synthesized_at: Utc::now(),
            latency_ms: 0.0,
            utterance,
        }
    }

    /// Whether this result carries audio worth releasing
    pub fn is_playable(&self) -> bool {
        self.success && self.audio.as_ref().map(|a| !a.is_empty()).unwrap_or(false)
    }
}

/// Metrics attached to a released utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub sequence_id: u64,
    pub language_code: String,
    pub latency_ms: f64,
    /// 0 to 100
    pub confidence: f64,
    /// 0 to 100
    pub quality_estimate: f64,
}

/// A clip released by the scheduler, in sequence order
#[derive(Debug, Clone)]
pub struct PlaybackItem {
    pub sequence_id: u64,
    pub audio: Vec<u8>,
    pub duration_secs: f64,
    pub source_text: String,
    pub translated_text: String,
    pub metrics: Metrics,
}

/// Text-only translation into a bridge language (not synthesized)
#[derive(Debug, Clone)]
pub struct TranslationItem {
    pub sequence_id: u64,
    pub source_text: String,
    pub translated_text: String,
    pub metrics: Metrics,
}

/// Everything a session emits to its output sink
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Synthesized audio, strictly in sequence order and paced
    Playback(PlaybackItem),
    /// Bridge-language text, emitted as soon as it arrives
    Translation(TranslationItem),
    /// Terminal failure; no further events follow
    Error { message: String },
}

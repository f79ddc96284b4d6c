use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::pipeline::Metrics;

/// Recognition result published by the upstream recognizer/translator
#[derive(Debug, Serialize, Deserialize)]
pub struct UtteranceMessage {
    pub session_id: String,
    /// Recognized source text
    pub text: String,
    /// Translations keyed by target language code
    #[serde(default)]
    pub translations: HashMap<String, String>,
    #[serde(default)]
    pub partial: bool,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Set when the recognizer canceled the stream (error details)
    #[serde(default)]
    pub canceled: Option<String>,
}

/// Request sent to the speech synthesis service
#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesisRequestMessage {
    pub text: String,
    pub ssml: String,
    pub voice: String,
}

/// Reply from the speech synthesis service
#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesisReplyMessage {
    /// Base64-encoded audio (16kHz 16-bit mono)
    #[serde(default)]
    pub audio: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Released clip published to the playback sink
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaybackAudioMessage {
    pub session_id: String,
    pub sequence: u64,
    pub audio: String, // Base64-encoded audio bytes
    pub duration_secs: f64,
    pub source_text: String,
    pub translated_text: String,
    pub metrics: Metrics,
    pub timestamp: String,
}

/// Bridge-language text published to the playback sink
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslationTextMessage {
    pub session_id: String,
    pub sequence: u64,
    pub language: String,
    pub source_text: String,
    pub translated_text: String,
    pub metrics: Metrics,
    pub timestamp: String,
}

/// Terminal session error
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionErrorMessage {
    pub session_id: String,
    pub message: String,
    pub timestamp: String,
}

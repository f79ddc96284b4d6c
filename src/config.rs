use anyhow::{Context, Result};
use serde::Deserialize;

use crate::synthesis::VoiceParams;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub nats: NatsConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub timeline: TimelineSettings,
    #[serde(default)]
    pub voice: VoiceParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    pub url: String,
    pub synthesis_subject: String,
    pub utterance_subject_prefix: String,
    pub output_subject_prefix: String,
    pub request_timeout_ms: u64,
}

/// Worker pool and scheduler tuning shared by every live session
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Concurrent synthesis calls (the synthesis service degrades above ~4)
    pub pool_size: usize,
    /// Extra silence added after each paced clip
    pub pacing_guard_ms: u64,
    /// Upper bound on a single gap-wait before the buffer is re-checked
    pub gap_wait_ms: u64,
    /// Capacity of the per-session output event channel
    pub event_buffer: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            pool_size: 2,
            pacing_guard_ms: 50,
            gap_wait_ms: 50,
            event_buffer: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    pub min_gap_secs: f64,
    pub sample_rate: u32,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            min_gap_secs: crate::timeline::DEFAULT_MIN_GAP_SECS,
            sample_rate: 16000,
        }
    }
}

impl Config {
    /// Load `path` (any extension the `config` crate understands) and overlay
    /// `SPEECH_RELAY__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("SPEECH_RELAY").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}

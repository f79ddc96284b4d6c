use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::scheduler::SchedulerConfig;
use crate::config::PipelineSettings;
use crate::synthesis::VoiceParams;

/// Configuration for a live translation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "session-2025-10-28-keynote")
    pub session_id: String,

    /// Recognition language of the incoming speech (e.g., "en-US")
    pub source_lang: String,

    /// Target language that is synthesized and played back
    pub primary_lang: String,

    /// Additional target languages emitted as text only
    pub bridge_langs: Vec<String>,

    /// Voice used for the primary language
    pub voice: VoiceParams,

    /// Concurrent synthesis calls (1-4)
    pub pool_size: usize,

    /// Silence added after each released clip
    pub pacing_guard: Duration,

    /// Longest single gap-wait before re-checking the reorder buffer
    pub gap_wait: Duration,

    /// Abandon synthesis calls slower than this
    pub synthesis_timeout: Option<Duration>,

    /// Capacity of the output event channel
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            source_lang: "en-US".to_string(),
            primary_lang: "fr".to_string(),
            bridge_langs: Vec::new(),
            voice: VoiceParams::default(),
            pool_size: 2,
            pacing_guard: Duration::from_millis(50),
            gap_wait: Duration::from_millis(50),
            synthesis_timeout: Some(Duration::from_secs(15)),
            event_buffer: 100,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by the service-wide pipeline settings
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            pool_size: settings.pool_size,
            pacing_guard: Duration::from_millis(settings.pacing_guard_ms),
            gap_wait: Duration::from_millis(settings.gap_wait_ms),
            event_buffer: settings.event_buffer,
            ..Self::default()
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            pacing_guard: self.pacing_guard,
            gap_wait: self.gap_wait,
        }
    }
}

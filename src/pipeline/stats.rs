use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a translation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Whether the session still accepts utterances
    pub is_running: bool,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Finalized utterances received (sequence ids issued)
    pub utterances_received: u64,

    /// Clips released to the output sink
    pub clips_released: u64,

    /// Sequence ids whose synthesis failed (released as silence)
    pub clips_dropped: u64,

    /// Completed results waiting on a lower sequence id
    pub pending: usize,

    /// Latency percentiles over released clips (failures excluded)
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,

    /// Mean confidence / quality over released clips
    pub avg_confidence: f64,
    pub avg_quality: f64,
}

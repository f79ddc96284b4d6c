// Test doubles shared by the pipeline integration tests
#![allow(dead_code)]

use anyhow::{bail, Result};
use chrono::Utc;
use speech_relay::pipeline::Utterance;
use speech_relay::synthesis::{SpeechSynthesizer, SynthesisRequest};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Synthesizer with per-text latency and failures.
///
/// Returns `bytes_per_call` bytes of silence (16kHz 16-bit mono, so 32000
/// bytes is one second).
pub struct ScriptedSynthesizer {
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    default_delay: Duration,
    bytes_per_call: usize,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub calls: AtomicUsize,
}

impl ScriptedSynthesizer {
    pub fn new() -> Self {
        Self {
            delays: HashMap::new(),
            failures: HashSet::new(),
            default_delay: Duration::from_millis(10),
            bytes_per_call: 32000,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn failing(mut self, text: &str) -> Self {
        self.failures.insert(text.to_string());
        self
    }

    pub fn with_bytes(mut self, bytes: usize) -> Self {
        self.bytes_per_call = bytes;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let delay = self
            .delays
            .get(&request.text)
            .copied()
            .unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;

        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failures.contains(&request.text) {
            bail!("scripted failure for '{}'", request.text);
        }
        Ok(vec![0u8; self.bytes_per_call])
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn utterance(id: u64, text: &str) -> Utterance {
    Utterance {
        sequence_id: id,
        source_text: format!("source {}", id),
        translated_text: text.to_string(),
        reported_confidence: Some(0.9),
        language_code: "fr".to_string(),
        received_at: Utc::now(),
    }
}

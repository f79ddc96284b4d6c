use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use super::backend::{SpeechSynthesizer, SynthesisRequest};
use super::voice::VoiceParams;
use crate::pipeline::{SynthesisResult, Utterance};

/// Largest pool size known to keep the synthesis service stable
pub const MAX_STABLE_POOL_SIZE: usize = 4;

/// Bounded set of concurrent synthesis calls
///
/// Each submitted utterance runs on its own task but at most `size` calls
/// reach the synthesizer at once. Every outcome, including errors,
/// timeouts, empty text, and a closed pool, comes back as a
/// `SynthesisResult`; nothing is raised to the caller.
#[derive(Clone)]
pub struct SynthesisWorkerPool {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    permits: Arc<Semaphore>,
    size: usize,
    timeout: Option<Duration>,
}

impl SynthesisWorkerPool {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, size: usize) -> Self {
        let size = size.max(1);
        if size > MAX_STABLE_POOL_SIZE {
            warn!(
                "Synthesis pool size {} exceeds {}; the synthesizer may become unstable",
                size, MAX_STABLE_POOL_SIZE
            );
        }

        debug!("Synthesis pool using '{}' with {} workers", synthesizer.name(), size);

        Self {
            synthesizer,
            permits: Arc::new(Semaphore::new(size)),
            size,
            timeout: None,
        }
    }

    /// Abandon synthesis calls that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Start synthesizing `utterance` right away.
    ///
    /// The returned future resolves to the result; dropping it does not
    /// cancel the work.
    pub fn submit(
        &self,
        utterance: Utterance,
        voice: VoiceParams,
    ) -> impl Future<Output = SynthesisResult> + Send + 'static {
        let fallback = utterance.clone();
        let worker = self.clone();
        let task = tokio::spawn(async move { worker.synthesize(utterance, voice).await });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!("Synthesis task for sequence {} failed: {}", fallback.sequence_id, e);
                    SynthesisResult::failed(fallback)
                }
            }
        }
    }

    /// Synthesize on the current task, waiting for a free worker slot
    pub async fn synthesize(&self, utterance: Utterance, voice: VoiceParams) -> SynthesisResult {
        let id = utterance.sequence_id;

        if utterance.translated_text.trim().is_empty() {
            debug!("Sequence {} has no text to synthesize", id);
            return SynthesisResult::failed(utterance);
        }

        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                debug!("Synthesis pool closed, dropping sequence {}", id);
                return SynthesisResult::failed(utterance);
            }
        };

        let request = SynthesisRequest::new(utterance.translated_text.clone(), voice);
        let started = Instant::now();

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.synthesizer.synthesize(&request))
                .await
                .unwrap_or_else(|_| Err(anyhow!("synthesis timed out after {:?}", limit))),
            None => self.synthesizer.synthesize(&request).await,
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(audio) if !audio.is_empty() => {
                let duration = self.synthesizer.format().duration_secs(audio.len());
                debug!(
                    "Synthesized sequence {} ({} bytes, {:.2}s) in {:.0}ms",
                    id,
                    audio.len(),
                    duration,
                    latency_ms
                );
                SynthesisResult::succeeded(utterance, audio, duration, latency_ms)
            }
            Ok(_) => {
                warn!("Synthesizer returned no audio for sequence {}", id);
                SynthesisResult::failed(utterance)
            }
            Err(e) => {
                warn!("Synthesis failed for sequence {}: {:#}", id, e);
                SynthesisResult::failed(utterance)
            }
        }
    }

    /// Stop accepting work; queued and future submissions resolve as failures
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}

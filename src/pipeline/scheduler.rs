//! Reorder-and-pace buffer
//!
//! Synthesis results complete in any order. The scheduler holds them in a
//! `ReorderBuffer` keyed by sequence id and a single consumer releases them
//! strictly in id order, sleeping for each released clip's playback
//! duration so consecutive clips never overlap at the sink.
//!
//! The buffer lock is held only for map inserts and removals, never across
//! an await point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Notify};
use tracing::{debug, info, warn};

use super::types::{Metrics, PlaybackItem, SessionEvent, SynthesisResult};
use crate::error::RelayError;
use crate::metrics::{JitterSource, MetricsAggregator, QualityEstimator};

/// Sparse map of completed results plus the next id to release.
///
/// Every key is `>= next_release_id`; the cursor only moves forward, one
/// id per release.
#[derive(Debug, Default)]
pub struct ReorderBuffer {
    pending: HashMap<u64, SynthesisResult>,
    next_release_id: u64,
}

impl ReorderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a completed result.
    ///
    /// Rejects ids already held or already released; either means two
    /// workers produced the same id.
    pub fn insert(&mut self, result: SynthesisResult) -> Result<(), RelayError> {
        let id = result.sequence_id;
        if id < self.next_release_id {
            return Err(RelayError::StaleSequence {
                id,
                next: self.next_release_id,
            });
        }
        if self.pending.contains_key(&id) {
            return Err(RelayError::DuplicateSequence { id });
        }
        self.pending.insert(id, result);
        Ok(())
    }

    /// Remove and return the result for `next_release_id`, if it has arrived
    pub fn pop_ready(&mut self) -> Option<SynthesisResult> {
        let result = self.pending.remove(&self.next_release_id)?;
        self.next_release_id += 1;
        Some(result)
    }

    pub fn next_release_id(&self) -> u64 {
        self.next_release_id
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Scheduler timing
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Extra delay after each clip's playback duration
    pub pacing_guard: Duration,
    /// Longest single gap-wait before the buffer is re-checked
    pub gap_wait: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pacing_guard: Duration::from_millis(50),
            gap_wait: Duration::from_millis(50),
        }
    }
}

impl SchedulerConfig {
    /// How long to hold the next release after a clip of `duration_secs`
    pub fn pacing_delay(&self, duration_secs: f64) -> Duration {
        let secs = if duration_secs.is_finite() {
            duration_secs.max(0.0)
        } else {
            0.0
        };
        Duration::from_secs_f64(secs) + self.pacing_guard
    }
}

struct Shared {
    buffer: Mutex<ReorderBuffer>,
    wake: Notify,
    released: AtomicU64,
    dropped: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ReorderBuffer> {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cloneable producer side of the scheduler
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Arc<Shared>,
}

impl SchedulerHandle {
    /// Hand a completed result to the scheduler. Never blocks.
    pub fn deposit(&self, result: SynthesisResult) -> Result<(), RelayError> {
        let id = result.sequence_id;
        self.shared.lock().insert(result)?;
        debug!("Deposited sequence {}", id);
        self.shared.wake.notify_one();
        Ok(())
    }

    /// Results waiting for a lower id
    pub fn pending(&self) -> usize {
        self.shared.lock().len()
    }

    pub fn next_release_id(&self) -> u64 {
        self.shared.lock().next_release_id()
    }

    /// Clips emitted to the sink
    pub fn released(&self) -> u64 {
        self.shared.released.load(Ordering::SeqCst)
    }

    /// Failed ids skipped without output
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::SeqCst)
    }
}

/// Single consumer that releases buffered results in sequence order
pub struct PlaybackScheduler {
    shared: Arc<Shared>,
    config: SchedulerConfig,
}

impl PlaybackScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                buffer: Mutex::new(ReorderBuffer::new()),
                wake: Notify::new(),
                released: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
            config,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Release results until `shutdown` flips to true (or its sender is
    /// dropped) or the event receiver goes away.
    ///
    /// Results still buffered at exit are discarded.
    pub async fn run<J: JitterSource>(
        self,
        mut estimator: QualityEstimator<J>,
        aggregator: Arc<Mutex<MetricsAggregator>>,
        events: mpsc::Sender<SessionEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("Playback scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let next = self.shared.lock().pop_ready();

            let result = match next {
                Some(result) => result,
                None => {
                    // Gap-wait: woken by the next deposit, re-checked at least every gap_wait
                    tokio::select! {
                        _ = self.shared.wake.notified() => {}
                        _ = tokio::time::sleep(self.config.gap_wait) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                    continue;
                }
            };

            if !result.is_playable() {
                self.shared.dropped.fetch_add(1, Ordering::SeqCst);
                debug!("Skipping failed sequence {}", result.sequence_id);
                continue;
            }

            let item = Self::to_playback_item(result, &mut estimator);
            let pacing = self.config.pacing_delay(item.duration_secs);

            match aggregator.lock() {
                Ok(mut aggregator) => aggregator.record(&item.metrics),
                Err(poisoned) => poisoned.into_inner().record(&item.metrics),
            }

            info!(
                "Releasing sequence {} ({:.2}s audio, confidence {:.1})",
                item.sequence_id, item.duration_secs, item.metrics.confidence
            );

            if events.send(SessionEvent::Playback(item)).await.is_err() {
                warn!("Playback sink closed, stopping scheduler");
                break;
            }
            self.shared.released.fetch_add(1, Ordering::SeqCst);

            tokio::select! {
                _ = tokio::time::sleep(pacing) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let abandoned = self.shared.lock().len();
        info!(
            "Playback scheduler stopped ({} released, {} dropped, {} abandoned)",
            self.shared.released.load(Ordering::SeqCst),
            self.shared.dropped.load(Ordering::SeqCst),
            abandoned
        );
    }

    fn to_playback_item<J: JitterSource>(
        result: SynthesisResult,
        estimator: &mut QualityEstimator<J>,
    ) -> PlaybackItem {
        let utterance = result.utterance;
        let estimate = estimator.estimate(
            &utterance.source_text,
            &utterance.translated_text,
            utterance.reported_confidence,
        );

        PlaybackItem {
            sequence_id: result.sequence_id,
            audio: result.audio.unwrap_or_default(),
            duration_secs: result.duration_estimate,
            metrics: Metrics {
                sequence_id: result.sequence_id,
                language_code: utterance.language_code,
                latency_ms: result.latency_ms,
                confidence: estimate.confidence,
                quality_estimate: estimate.quality_estimate,
            },
            source_text: utterance.source_text,
            translated_text: utterance.translated_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::Utterance;
    use chrono::Utc;

    fn utterance(id: u64) -> Utterance {
        Utterance {
            sequence_id: id,
            source_text: format!("source {}", id),
            translated_text: format!("target {}", id),
            reported_confidence: None,
            language_code: "fr".to_string(),
            received_at: Utc::now(),
        }
    }

    fn ok(id: u64) -> SynthesisResult {
        SynthesisResult::succeeded(utterance(id), vec![0u8; 320], 0.01, 5.0)
    }

    #[test]
    fn test_buffer_releases_in_order() {
        let mut buffer = ReorderBuffer::new();
        buffer.insert(ok(1)).unwrap();
        buffer.insert(ok(2)).unwrap();

        // Id 0 has not arrived: nothing is ready
        assert!(buffer.pop_ready().is_none());
        assert_eq!(buffer.next_release_id(), 0);

        buffer.insert(ok(0)).unwrap();
        let released: Vec<u64> = std::iter::from_fn(|| buffer.pop_ready())
            .map(|r| r.sequence_id)
            .collect();
        assert_eq!(released, vec![0, 1, 2]);
        assert_eq!(buffer.next_release_id(), 3);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_buffer_rejects_duplicate_id() {
        let mut buffer = ReorderBuffer::new();
        buffer.insert(ok(3)).unwrap();
        assert_eq!(
            buffer.insert(ok(3)),
            Err(RelayError::DuplicateSequence { id: 3 })
        );
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_buffer_rejects_released_id() {
        let mut buffer = ReorderBuffer::new();
        buffer.insert(ok(0)).unwrap();
        buffer.pop_ready().unwrap();

        let err = buffer.insert(ok(0)).unwrap_err();
        assert_eq!(err, RelayError::StaleSequence { id: 0, next: 1 });
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_pacing_delay() {
        let config = SchedulerConfig::default();
        assert_eq!(config.pacing_delay(2.0), Duration::from_millis(2050));
        assert_eq!(config.pacing_delay(-1.0), Duration::from_millis(50));
        assert_eq!(config.pacing_delay(f64::NAN), Duration::from_millis(50));
    }
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::config::SessionConfig;
use super::scheduler::{PlaybackScheduler, SchedulerHandle};
use super::sequence::SequenceAllocator;
use super::stats::SessionStats;
use super::types::{Metrics, SessionEvent, SynthesisResult, TranslationItem, Utterance};
use crate::error::RelayError;
use crate::metrics::{reported_estimate, MetricsAggregator, QualityEstimator};
use crate::synthesis::{SpeechSynthesizer, SynthesisWorkerPool};

/// A finalized recognition result from the upstream recognizer/translator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognitionEvent {
    /// Recognized source text
    pub source_text: String,

    /// Translations keyed by target language code
    pub translations: HashMap<String, String>,

    /// Recognizer confidence (0.0 to 1.0), if available
    pub confidence: Option<f64>,
}

/// Shared stop path used by `stop`, upstream cancellation and fatal errors
#[derive(Clone)]
struct Terminator {
    events_tx: mpsc::Sender<SessionEvent>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    is_running: Arc<AtomicBool>,
    terminated: Arc<AtomicBool>,
    pool: SynthesisWorkerPool,
}

impl Terminator {
    /// Stop accepting work and stop the scheduler
    fn halt(&self) {
        self.is_running.store(false, Ordering::SeqCst);
        self.pool.close();
        // Stored even before the scheduler subscribes
        self.shutdown_tx.send_replace(true);
    }

    fn is_halted(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Halt and emit the session's single terminal error event
    async fn fail(&self, message: String) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        self.halt();
        if self.events_tx.send(SessionEvent::Error { message }).await.is_err() {
            warn!("Output sink closed before terminal error could be delivered");
        }
    }
}

/// Hand a finished result to the scheduler; a rejected deposit ends the session
async fn deliver(scheduler: &SchedulerHandle, terminator: &Terminator, result: SynthesisResult) {
    if let Err(e) = scheduler.deposit(result) {
        error!("Reorder buffer invariant violated: {}", e);
        terminator.fail(format!("internal error: {}", e)).await;
    }
}

/// A live speech-to-speech translation session
///
/// Owns the per-session pipeline: sequence allocation, the synthesis worker
/// pool, and the reorder/pacing scheduler. Output is delivered on the event
/// receiver returned by `new`.
pub struct TranslationSession {
    /// Session configuration
    config: SessionConfig,

    /// Issues sequence ids in arrival order
    allocator: SequenceAllocator,

    /// Bounded synthesis workers
    pool: SynthesisWorkerPool,

    /// Producer side of the reorder buffer
    scheduler: SchedulerHandle,

    /// Consumer side, taken when the session starts
    pending_scheduler: Mutex<Option<PlaybackScheduler>>,

    /// Metrics of every released clip
    aggregator: Arc<StdMutex<MetricsAggregator>>,

    /// Output sink
    events_tx: mpsc::Sender<SessionEvent>,

    terminator: Terminator,

    /// When the session was created
    started_at: DateTime<Utc>,

    /// Whether the session accepts utterances
    is_running: Arc<AtomicBool>,

    utterances_received: AtomicU64,

    /// Handle for the scheduler task
    scheduler_task: Mutex<Option<JoinHandle<()>>>,
}

impl TranslationSession {
    /// Create a new session and the receiver for its output events
    pub fn new(
        config: SessionConfig,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        info!(
            "Creating translation session: {} ({} -> {}, bridges: {:?})",
            config.session_id, config.source_lang, config.primary_lang, config.bridge_langs
        );

        let mut pool = SynthesisWorkerPool::new(synthesizer, config.pool_size);
        if let Some(timeout) = config.synthesis_timeout {
            pool = pool.with_timeout(timeout);
        }

        let scheduler = PlaybackScheduler::new(config.scheduler_config());
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer.max(1));
        let (shutdown_tx, _) = watch::channel(false);
        let is_running = Arc::new(AtomicBool::new(false));

        let terminator = Terminator {
            events_tx: events_tx.clone(),
            shutdown_tx: Arc::new(shutdown_tx),
            is_running: Arc::clone(&is_running),
            terminated: Arc::new(AtomicBool::new(false)),
            pool: pool.clone(),
        };

        let session = Self {
            config,
            allocator: SequenceAllocator::new(),
            pool,
            scheduler: scheduler.handle(),
            pending_scheduler: Mutex::new(Some(scheduler)),
            aggregator: Arc::new(StdMutex::new(MetricsAggregator::new())),
            events_tx,
            terminator,
            started_at: Utc::now(),
            is_running,
            utterances_received: AtomicU64::new(0),
            scheduler_task: Mutex::new(None),
        };

        (session, events_rx)
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Start the playback scheduler
    pub async fn start(&self) -> Result<(), RelayError> {
        if self.terminator.is_halted() {
            return Err(RelayError::SessionStopped);
        }

        let scheduler = {
            let mut pending = self.pending_scheduler.lock().await;
            pending.take()
        };

        let Some(scheduler) = scheduler else {
            if self.is_running() {
                warn!("Session {} already started", self.config.session_id);
                return Ok(());
            }
            return Err(RelayError::SessionStopped);
        };

        info!("Starting translation session: {}", self.config.session_id);
        self.is_running.store(true, Ordering::SeqCst);

        let task = tokio::spawn(scheduler.run(
            QualityEstimator::new(),
            Arc::clone(&self.aggregator),
            self.events_tx.clone(),
            self.terminator.shutdown_tx.subscribe(),
        ));

        {
            let mut handle = self.scheduler_task.lock().await;
            *handle = Some(task);
        }

        Ok(())
    }

    /// Accept a finalized recognition result.
    ///
    /// Assigns the next sequence id and submits the primary translation for
    /// synthesis (an empty translation still consumes its id and is released
    /// as a gap). Bridge-language translations are emitted immediately.
    pub async fn ingest(&self, event: RecognitionEvent) -> Result<u64, RelayError> {
        if !self.is_running() {
            return Err(RelayError::SessionStopped);
        }

        let sequence_id = self.allocator.next();
        self.utterances_received.fetch_add(1, Ordering::SeqCst);

        let utterance = Utterance {
            sequence_id,
            source_text: event.source_text.clone(),
            translated_text: event
                .translations
                .get(&self.config.primary_lang)
                .cloned()
                .unwrap_or_default(),
            reported_confidence: event.confidence,
            language_code: self.config.primary_lang.clone(),
            received_at: Utc::now(),
        };

        let pending = self.pool.submit(utterance, self.config.voice.clone());
        let scheduler = self.scheduler.clone();
        let terminator = self.terminator.clone();

        tokio::spawn(async move {
            let result = pending.await;
            deliver(&scheduler, &terminator, result).await;
        });

        self.emit_bridge_translations(sequence_id, &event).await;

        Ok(sequence_id)
    }

    async fn emit_bridge_translations(&self, sequence_id: u64, event: &RecognitionEvent) {
        for lang in &self.config.bridge_langs {
            if *lang == self.config.primary_lang {
                continue;
            }
            let Some(text) = event.translations.get(lang) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }

            let estimate = reported_estimate(&event.source_text, text, event.confidence);

            let item = TranslationItem {
                sequence_id,
                source_text: event.source_text.clone(),
                translated_text: text.clone(),
                metrics: Metrics {
                    sequence_id,
                    language_code: lang.clone(),
                    latency_ms: 0.0,
                    confidence: estimate.confidence,
                    quality_estimate: estimate.quality_estimate,
                },
            };

            if self.events_tx.send(SessionEvent::Translation(item)).await.is_err() {
                warn!("Output sink closed, dropping {} translation", lang);
                return;
            }
        }
    }

    /// Upstream cancellation or error: emit one terminal error and stop
    pub async fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        error!("Session {} failed: {}", self.config.session_id, message);
        self.terminator.fail(message).await;
        self.join_scheduler().await;
    }

    /// Stop the session; buffered results that have not been released are dropped
    pub async fn stop(&self) -> SessionStats {
        if self.is_running() {
            info!("Stopping translation session: {}", self.config.session_id);
        } else {
            warn!("Session {} not active", self.config.session_id);
        }

        self.terminator.halt();
        self.join_scheduler().await;

        info!("Translation session stopped: {}", self.config.session_id);

        self.get_stats()
    }

    async fn join_scheduler(&self) {
        let task = {
            let mut handle = self.scheduler_task.lock().await;
            handle.take()
        };
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Scheduler task panicked: {}", e);
            }
        }
    }

    /// Get current session statistics
    pub fn get_stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);
        let summary = self
            .aggregator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .summary();

        SessionStats {
            session_id: self.config.session_id.clone(),
            is_running: self.is_running(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            utterances_received: self.utterances_received.load(Ordering::SeqCst),
            clips_released: self.scheduler.released(),
            clips_dropped: self.scheduler.dropped(),
            pending: self.scheduler.pending(),
            p95_latency_ms: summary.p95_latency_ms,
            p99_latency_ms: summary.p99_latency_ms,
            avg_confidence: summary.avg_confidence,
            avg_quality: summary.avg_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::SilentSynthesizer;

    fn session() -> (TranslationSession, mpsc::Receiver<SessionEvent>) {
        let config = SessionConfig {
            session_id: "unit-session".to_string(),
            ..SessionConfig::default()
        };
        TranslationSession::new(config, Arc::new(SilentSynthesizer::default()))
    }

    fn clip(id: u64) -> SynthesisResult {
        let utterance = Utterance {
            sequence_id: id,
            source_text: "Hello".to_string(),
            translated_text: "Bonjour".to_string(),
            reported_confidence: Some(0.9),
            language_code: "fr".to_string(),
            received_at: Utc::now(),
        };
        SynthesisResult::succeeded(utterance, vec![0u8; 3200], 0.1, 5.0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_sequence_id_ends_session() {
        let (session, mut events) = session();
        session.start().await.unwrap();

        deliver(&session.scheduler, &session.terminator, clip(0)).await;
        deliver(&session.scheduler, &session.terminator, clip(0)).await;
        // Further violations after termination stay silent
        deliver(&session.scheduler, &session.terminator, clip(0)).await;
        session.join_scheduler().await;

        let mut errors = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::Error { message } = event {
                errors.push(message);
            }
        }

        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("internal error:"), "{}", errors[0]);
        assert!(!session.is_running());
        assert_eq!(
            session.ingest(RecognitionEvent::default()).await,
            Err(RelayError::SessionStopped)
        );
    }
}

// Integration tests for the reorder-and-pace scheduler
//
// These run on tokio's paused clock so pacing can be measured exactly.

mod common;

use common::utterance;
use speech_relay::metrics::{MetricsAggregator, NoJitter, QualityEstimator};
use speech_relay::pipeline::{
    PlaybackScheduler, SchedulerConfig, SchedulerHandle, SessionEvent, SynthesisResult,
};
use speech_relay::RelayError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct Harness {
    handle: SchedulerHandle,
    events: mpsc::Receiver<SessionEvent>,
    aggregator: Arc<Mutex<MetricsAggregator>>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    scheduler: Option<PlaybackScheduler>,
}

impl Harness {
    fn new() -> Self {
        let scheduler = PlaybackScheduler::new(SchedulerConfig::default());
        let (_, events) = mpsc::channel(1);
        let (shutdown, _) = watch::channel(false);
        Self {
            handle: scheduler.handle(),
            events,
            aggregator: Arc::new(Mutex::new(MetricsAggregator::new())),
            shutdown,
            task: None,
            scheduler: Some(scheduler),
        }
    }

    fn start(&mut self) {
        let (tx, rx) = mpsc::channel(16);
        self.events = rx;
        let scheduler = self.scheduler.take().unwrap();
        self.task = Some(tokio::spawn(scheduler.run(
            QualityEstimator::with_jitter(NoJitter),
            Arc::clone(&self.aggregator),
            tx,
            self.shutdown.subscribe(),
        )));
    }

    async fn next_playback(&mut self) -> (u64, Instant) {
        match self.events.recv().await {
            Some(SessionEvent::Playback(item)) => (item.sequence_id, Instant::now()),
            other => panic!("expected playback, got {:?}", other),
        }
    }

    async fn stop(&mut self) {
        self.shutdown.send(true).unwrap();
        self.task.take().unwrap().await.unwrap();
    }
}

/// One second of audio
fn ok(id: u64) -> SynthesisResult {
    SynthesisResult::succeeded(utterance(id, &format!("texte {}", id)), vec![0u8; 32000], 1.0, 20.0)
}

fn failed(id: u64) -> SynthesisResult {
    SynthesisResult::failed(utterance(id, &format!("texte {}", id)))
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_deposits_release_in_order() {
    let mut harness = Harness::new();
    harness.handle.deposit(ok(1)).unwrap();
    harness.handle.deposit(ok(2)).unwrap();
    harness.handle.deposit(ok(0)).unwrap();
    harness.start();

    let mut released = Vec::new();
    for _ in 0..3 {
        released.push(harness.next_playback().await.0);
    }

    assert_eq!(released, vec![0, 1, 2]);
    harness.stop().await;
    assert_eq!(harness.handle.released(), 3);
    assert_eq!(harness.handle.next_release_id(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_releases_are_paced_by_clip_duration() {
    let mut harness = Harness::new();
    for id in 0..3 {
        harness.handle.deposit(ok(id)).unwrap();
    }
    harness.start();

    let (_, first) = harness.next_playback().await;
    let (_, second) = harness.next_playback().await;
    let (_, third) = harness.next_playback().await;

    // 1.0s clip plus the 50ms guard between consecutive releases
    assert!(second - first >= Duration::from_millis(1050));
    assert!(third - second >= Duration::from_millis(1050));
    assert!(third - first >= Duration::from_millis(2100));

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_ids_are_skipped_without_output() {
    let mut harness = Harness::new();
    harness.handle.deposit(ok(0)).unwrap();
    harness.handle.deposit(failed(1)).unwrap();
    harness.handle.deposit(ok(2)).unwrap();
    harness.start();

    assert_eq!(harness.next_playback().await.0, 0);
    assert_eq!(harness.next_playback().await.0, 2);

    harness.stop().await;
    assert_eq!(harness.handle.released(), 2);
    assert_eq!(harness.handle.dropped(), 1);

    // Only released clips contribute metrics
    let summary = harness.aggregator.lock().unwrap().summary();
    assert_eq!(summary.count, 2);
    assert!((summary.avg_confidence - 90.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_missing_id() {
    let mut harness = Harness::new();
    harness.start();
    harness.handle.deposit(ok(1)).unwrap();

    // Id 0 is still in flight: nothing may be released
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(harness.events.try_recv().is_err());
    assert_eq!(harness.handle.pending(), 1);

    harness.handle.deposit(ok(0)).unwrap();
    assert_eq!(harness.next_playback().await.0, 0);
    assert_eq!(harness.next_playback().await.0, 1);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_deposits_from_many_tasks() {
    let mut harness = Harness::new();
    harness.start();

    // Higher ids finish first
    let producers: Vec<_> = (0..8u64)
        .map(|id| {
            let handle = harness.handle.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(400 - id * 50)).await;
                handle.deposit(ok(id)).unwrap();
            })
        })
        .collect();

    let mut released = Vec::new();
    for _ in 0..8 {
        released.push(harness.next_playback().await.0);
    }
    for producer in producers {
        producer.await.unwrap();
    }

    assert_eq!(released, (0..8).collect::<Vec<_>>());
    harness.stop().await;
}

#[tokio::test]
async fn test_duplicate_and_stale_deposits_are_rejected() {
    let mut harness = Harness::new();
    harness.handle.deposit(ok(0)).unwrap();
    assert_eq!(
        harness.handle.deposit(ok(0)),
        Err(RelayError::DuplicateSequence { id: 0 })
    );

    harness.start();
    assert_eq!(harness.next_playback().await.0, 0);

    let err = harness.handle.deposit(ok(0)).unwrap_err();
    assert!(err.is_invariant_violation());
    assert!(matches!(err, RelayError::StaleSequence { id: 0, .. }));

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_buffered_results() {
    let mut harness = Harness::new();
    harness.handle.deposit(ok(1)).unwrap();
    harness.handle.deposit(ok(2)).unwrap();
    harness.start();

    tokio::time::sleep(Duration::from_millis(200)).await;
    harness.stop().await;

    assert_eq!(harness.handle.released(), 0);
    assert_eq!(harness.handle.pending(), 2);
    // Sink closes once the scheduler exits
    assert!(harness.events.recv().await.is_none());
}

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::assembler::{PlacedClip, TimelineAssembler, TimelineClip};
use super::render::render_timeline;
use super::srt;
use crate::config::TimelineSettings;
use crate::pipeline::Utterance;
use crate::synthesis::{decode_pcm, density_adjusted_rate, SynthesisWorkerPool, VoiceParams};

/// One recognized segment of the source media
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DubSegment {
    /// Translated text to speak
    pub text: String,
    /// Offset of the source utterance (seconds)
    pub start: f64,
    /// Length of the source utterance (seconds)
    #[serde(default)]
    pub duration: f64,
    /// Source-language text
    #[serde(default)]
    pub original: Option<String>,
}

/// Result of a batch dubbing run
#[derive(Debug)]
pub struct DubOutput {
    /// Clips at their final positions (samples as payload)
    pub placed: Vec<PlacedClip<Vec<i16>>>,
    /// Rendered mono track
    pub samples: Vec<i16>,
    /// Subtitles for the placed clips
    pub srt: String,
    /// Segments whose synthesis failed
    pub failed: usize,
}

/// Synthesize every segment, place the clips, and render the track.
///
/// Each segment's speaking rate is raised when its text is too dense for
/// its source slot. The track lasts at least `min_total_secs`.
pub async fn run_batch(
    segments: Vec<DubSegment>,
    pool: &SynthesisWorkerPool,
    voice: &VoiceParams,
    settings: &TimelineSettings,
    min_total_secs: f64,
) -> DubOutput {
    info!(
        "Dubbing {} segments with {} workers",
        segments.len(),
        pool.size()
    );

    let pending: Vec<_> = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let rate = density_adjusted_rate(&voice.rate, &segment.text, segment.duration);
            let utterance = Utterance {
                sequence_id: i as u64,
                source_text: segment.original.clone().unwrap_or_default(),
                translated_text: segment.text.clone(),
                reported_confidence: None,
                language_code: String::new(),
                received_at: Utc::now(),
            };
            pool.submit(utterance, voice.with_rate(rate))
        })
        .collect();

    let results = join_all(pending).await;

    let mut clips = Vec::with_capacity(results.len());
    let mut failed = 0;

    for (segment, result) in segments.iter().zip(results) {
        let audio = match result.audio {
            Some(audio) if result.success => audio,
            _ => {
                warn!("No audio for segment at {:.2}s, skipping", segment.start);
                failed += 1;
                continue;
            }
        };

        let samples = match decode_pcm(&audio) {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Undecodable audio for segment at {:.2}s: {:#}", segment.start, e);
                failed += 1;
                continue;
            }
        };

        let duration = samples.len() as f64 / settings.sample_rate as f64;
        clips.push(TimelineClip {
            clip: samples,
            text: segment.text.clone(),
            nominal_start: segment.start,
            duration,
        });
    }

    let placed = TimelineAssembler::new(settings.min_gap_secs).assemble(clips);
    let samples = render_timeline(&placed, settings.sample_rate, min_total_secs);
    let srt = srt::generate(&placed);

    info!(
        "Dubbed timeline: {} clips placed, {} failed, {:.1}s total",
        placed.len(),
        failed,
        samples.len() as f64 / settings.sample_rate as f64
    );

    DubOutput {
        placed,
        samples,
        srt,
        failed,
    }
}

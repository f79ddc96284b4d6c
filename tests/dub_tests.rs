// Integration tests for batch dubbing
//
// Segments are synthesized as silence, placed on one timeline, rendered to
// a WAV file and captioned.

use anyhow::Result;
use speech_relay::config::TimelineSettings;
use speech_relay::synthesis::{SilentSynthesizer, SynthesisWorkerPool, VoiceParams};
use speech_relay::timeline::{run_batch, write_wav, DubSegment};
use std::sync::Arc;
use tempfile::TempDir;

fn segment(text: &str, start: f64, duration: f64) -> DubSegment {
    DubSegment {
        text: text.to_string(),
        start,
        duration,
        original: None,
    }
}

#[tokio::test]
async fn test_overlapping_segments_are_shifted() -> Result<()> {
    let pool = SynthesisWorkerPool::new(Arc::new(SilentSynthesizer::default()), 2);
    let settings = TimelineSettings::default();

    let segments = vec![
        // 30 characters: 2.0s of speech
        segment(&"a".repeat(30), 0.0, 1.5),
        // 15 characters: 1.0s, but the slot before it is still playing
        segment(&"b".repeat(15), 1.0, 1.0),
        // Nothing to say
        segment("", 10.0, 1.0),
    ];

    let output = run_batch(segments, &pool, &VoiceParams::default(), &settings, 0.0).await;

    assert_eq!(output.failed, 1);
    assert_eq!(output.placed.len(), 2);
    assert_eq!(output.placed[0].actual_start, 0.0);
    assert!((output.placed[1].actual_start - 2.05).abs() < 1e-9);
    assert!((output.placed[1].shift() - 1.05).abs() < 1e-9);

    // Track ends with the last clip: (2.05 + 1.0) seconds at 16kHz
    assert_eq!(output.samples.len(), 48800);

    assert!(output.srt.starts_with("1\n00:00:00,000 --> 00:00:02,000\n"));
    assert!(output.srt.contains("2\n00:00:02,050 --> 00:00:03,050\n"));

    Ok(())
}

#[tokio::test]
async fn test_track_is_padded_to_minimum_length() -> Result<()> {
    let pool = SynthesisWorkerPool::new(Arc::new(SilentSynthesizer::default()), 1);
    let settings = TimelineSettings::default();

    let output = run_batch(
        vec![segment("Bonjour", 0.5, 1.0)],
        &pool,
        &VoiceParams::default(),
        &settings,
        5.0,
    )
    .await;

    assert_eq!(output.failed, 0);
    assert_eq!(output.samples.len(), 5 * 16000);

    Ok(())
}

#[tokio::test]
async fn test_rendered_track_round_trips_through_wav() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("dub.wav");

    let pool = SynthesisWorkerPool::new(Arc::new(SilentSynthesizer::default()), 2);
    let settings = TimelineSettings::default();
    let output = run_batch(
        vec![segment("Bonjour à tous", 0.0, 1.0), segment("Merci", 3.0, 0.5)],
        &pool,
        &VoiceParams::default(),
        &settings,
        0.0,
    )
    .await;

    write_wav(&path, &output.samples, settings.sample_rate)?;

    let reader = hound::WavReader::open(&path)?;
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 16000);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.len() as usize, output.samples.len());

    Ok(())
}

#[test]
fn test_manifest_segment_defaults() {
    let segments: Vec<DubSegment> =
        serde_json::from_str(r#"[{ "text": "Salut", "start": 1.5 }]"#).unwrap();
    assert_eq!(segments[0].duration, 0.0);
    assert!(segments[0].original.is_none());
}

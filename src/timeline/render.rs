use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::assembler::PlacedClip;

/// Lay placed clips onto one mono track.
///
/// Each clip starts at `round(actual_start * sample_rate)`. The track is
/// at least `min_total_secs` long. Samples that still overlap (rounding
/// only) are summed with clipping.
pub fn render_timeline(
    placed: &[PlacedClip<Vec<i16>>],
    sample_rate: u32,
    min_total_secs: f64,
) -> Vec<i16> {
    let offset_of = |secs: f64| (secs.max(0.0) * sample_rate as f64).round() as usize;

    let end = placed
        .iter()
        .map(|p| offset_of(p.actual_start) + p.clip.len())
        .max()
        .unwrap_or(0)
        .max(offset_of(min_total_secs));

    let mut track = vec![0i16; end];

    for clip in placed {
        let offset = offset_of(clip.actual_start);
        for (slot, &sample) in track[offset..offset + clip.clip.len()].iter_mut().zip(&clip.clip) {
            *slot = (*slot as i32 + sample as i32).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        }
    }

    track
}

/// Write mono 16-bit PCM to a WAV file
pub fn write_wav(path: impl AsRef<Path>, samples: &[i16], sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .context("Failed to write sample to WAV")?;
    }

    writer.finalize().context("Failed to finalize WAV file")?;

    info!(
        "Wrote {:.1}s timeline to {}",
        samples.len() as f64 / sample_rate as f64,
        path.display()
    );

    Ok(())
}

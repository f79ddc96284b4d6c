use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// PCM layout returned by the synthesis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // Riff16Khz16BitMonoPcm
            bits_per_sample: 16,
            channels: 1,
        }
    }
}

impl AudioFormat {
    pub fn bytes_per_second(&self) -> u32 {
        self.sample_rate * (self.bits_per_sample as u32 / 8) * self.channels as u32
    }

    /// Playback duration implied by a buffer of `byte_len` bytes.
    ///
    /// Derived from the byte count alone, never from wall-clock call time.
    pub fn duration_secs(&self, byte_len: usize) -> f64 {
        let bps = self.bytes_per_second();
        if bps == 0 {
            return 0.0;
        }
        byte_len as f64 / bps as f64
    }
}

fn is_riff(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Decode synthesized audio into i16 samples.
///
/// RIFF/WAVE payloads are parsed with `hound`; anything else is taken as raw
/// little-endian 16-bit PCM (a trailing odd byte is ignored).
pub fn decode_pcm(bytes: &[u8]) -> Result<Vec<i16>> {
    if is_riff(bytes) {
        let reader = hound::WavReader::new(Cursor::new(bytes)).context("Failed to parse WAV clip")?;
        return reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read WAV clip samples");
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect())
}

/// Encode samples as raw little-endian PCM bytes
pub fn encode_pcm(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

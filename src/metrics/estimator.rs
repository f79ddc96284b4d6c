use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const TERMINAL_PUNCTUATION: [char; 6] = ['.', '?', '!', '。', '？', '！'];

/// Jitter amplitude (points) added to heuristic confidence
pub const DEFAULT_JITTER: f64 = 5.0;

/// Source of the random variation added to heuristic confidence
pub trait JitterSource: Send {
    /// A value in `[-amplitude, amplitude]`
    fn sample(&mut self, amplitude: f64) -> f64;
}

/// Uniform jitter from a seedable generator
pub struct RandomJitter {
    rng: StdRng,
}

impl RandomJitter {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl JitterSource for RandomJitter {
    fn sample(&mut self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-amplitude..=amplitude)
    }
}

/// Deterministic jitter: always zero
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn sample(&mut self, _amplitude: f64) -> f64 {
        0.0
    }
}

/// Confidence and quality for one utterance, both in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityEstimate {
    pub confidence: f64,
    pub quality_estimate: f64,
}

/// Reference-free translation quality heuristic
pub struct QualityEstimator<J = RandomJitter> {
    jitter: J,
    amplitude: f64,
}

impl QualityEstimator<RandomJitter> {
    pub fn new() -> Self {
        Self::with_jitter(RandomJitter::new())
    }
}

impl Default for QualityEstimator<RandomJitter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: JitterSource> QualityEstimator<J> {
    pub fn with_jitter(jitter: J) -> Self {
        Self {
            jitter,
            amplitude: DEFAULT_JITTER,
        }
    }

    /// Estimate confidence and quality of `translated` against `original`.
    ///
    /// `reported_confidence` is the recognizer's own score in `[0, 1]`.
    pub fn estimate(
        &mut self,
        original: &str,
        translated: &str,
        reported_confidence: Option<f64>,
    ) -> QualityEstimate {
        let deviation = (length_ratio(original, translated) - 1.0).abs();

        let confidence = match reported_confidence {
            Some(reported) => (reported * 100.0).clamp(0.0, 100.0),
            None => {
                if original.is_empty() || translated.is_empty() {
                    return QualityEstimate {
                        confidence: 0.0,
                        quality_estimate: 0.0,
                    };
                }
                let ratio_score = (100.0 - deviation * 40.0).max(0.0);
                let structure_score =
                    if ends_with_terminal(original) == ends_with_terminal(translated) {
                        100.0
                    } else {
                        85.0
                    };
                let base = ratio_score * 0.6 + structure_score * 0.4;
                (base + self.jitter.sample(self.amplitude)).clamp(0.0, 100.0)
            }
        };

        QualityEstimate {
            confidence,
            quality_estimate: confidence * consistency_factor(deviation),
        }
    }
}

/// Estimate from the recognizer's confidence only; missing confidence scores 0.
///
/// Used for text-only translations, which get no heuristic fallback.
pub fn reported_estimate(
    original: &str,
    translated: &str,
    reported_confidence: Option<f64>,
) -> QualityEstimate {
    let deviation = (length_ratio(original, translated) - 1.0).abs();
    let confidence = reported_confidence
        .map(|reported| (reported * 100.0).clamp(0.0, 100.0))
        .unwrap_or(0.0);

    QualityEstimate {
        confidence,
        quality_estimate: confidence * consistency_factor(deviation),
    }
}

/// Translated length over original length, in characters (0 when original is empty)
pub fn length_ratio(original: &str, translated: &str) -> f64 {
    let original_len = original.chars().count();
    if original_len == 0 {
        return 0.0;
    }
    translated.chars().count() as f64 / original_len as f64
}

/// Penalty for translations much longer or shorter than the source, in `[0.7, 1.0]`
fn consistency_factor(deviation: f64) -> f64 {
    (1.0 - deviation * 0.2).clamp(0.7, 1.0)
}

fn ends_with_terminal(text: &str) -> bool {
    text.trim_end()
        .chars()
        .last()
        .map(|c| TERMINAL_PUNCTUATION.contains(&c))
        .unwrap_or(false)
}

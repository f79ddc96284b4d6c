use serde::{Deserialize, Serialize};
use tracing::debug;

use super::DEFAULT_MIN_GAP_SECS;

/// A synthesized clip with the start time of its source utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineClip<C> {
    /// Clip payload (audio samples, file path, id, ...)
    pub clip: C,
    /// Text spoken in the clip
    pub text: String,
    /// Where the source utterance occurred (seconds)
    pub nominal_start: f64,
    /// Clip length (seconds)
    pub duration: f64,
}

/// A clip at its final, collision-free position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedClip<C> {
    pub clip: C,
    pub text: String,
    pub nominal_start: f64,
    pub actual_start: f64,
    pub duration: f64,
}

impl<C> PlacedClip<C> {
    pub fn end(&self) -> f64 {
        self.actual_start + self.duration
    }

    /// How far the clip was pushed back from its nominal start
    pub fn shift(&self) -> f64 {
        self.actual_start - self.nominal_start
    }
}

/// Greedy single-pass placement of clips onto a non-overlapping timeline
#[derive(Debug, Clone, Copy)]
pub struct TimelineAssembler {
    min_gap: f64,
}

impl Default for TimelineAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_GAP_SECS)
    }
}

impl TimelineAssembler {
    pub fn new(min_gap: f64) -> Self {
        Self {
            min_gap: if min_gap.is_finite() {
                min_gap.max(0.0)
            } else {
                DEFAULT_MIN_GAP_SECS
            },
        }
    }

    pub fn min_gap(&self) -> f64 {
        self.min_gap
    }

    /// Place `clips` in nominal-start order.
    ///
    /// A clip keeps its nominal start unless that falls before the end of
    /// the previously placed clip, in which case it starts `min_gap` after
    /// that end. Ties keep input order. Clips with no text or no positive
    /// duration are dropped before placement.
    pub fn assemble<C>(&self, clips: Vec<TimelineClip<C>>) -> Vec<PlacedClip<C>> {
        let mut clips: Vec<TimelineClip<C>> = clips
            .into_iter()
            .filter(|c| {
                let keep = !c.text.trim().is_empty()
                    && c.duration.is_finite()
                    && c.duration > 0.0
                    && c.nominal_start.is_finite();
                if !keep {
                    debug!("Skipping empty clip at {:.2}s", c.nominal_start);
                }
                keep
            })
            .collect();

        // slice::sort_by is stable
        clips.sort_by(|a, b| a.nominal_start.total_cmp(&b.nominal_start));

        let mut cursor = 0.0;
        let mut placed = Vec::with_capacity(clips.len());

        for clip in clips {
            let actual_start = if clip.nominal_start >= cursor {
                clip.nominal_start
            } else {
                cursor + self.min_gap
            };
            cursor = actual_start + clip.duration;

            if actual_start > clip.nominal_start {
                debug!(
                    "Shifted clip from {:.2}s to {:.2}s",
                    clip.nominal_start, actual_start
                );
            }

            placed.push(PlacedClip {
                clip: clip.clip,
                text: clip.text,
                nominal_start: clip.nominal_start,
                actual_start,
                duration: clip.duration,
            });
        }

        placed
    }
}

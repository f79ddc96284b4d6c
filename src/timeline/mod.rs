//! Offline dubbing timeline
//!
//! When every segment is known up front, synthesized clips are placed on a
//! single non-overlapping timeline, rendered to one WAV track, and paired
//! with an SRT subtitle file.

pub mod assembler;
pub mod dub;
pub mod render;
pub mod srt;

/// Default silence inserted between clips that had to be shifted
pub const DEFAULT_MIN_GAP_SECS: f64 = 0.05;

pub use assembler::{PlacedClip, TimelineAssembler, TimelineClip};
pub use dub::{run_batch, DubOutput, DubSegment};
pub use render::{render_timeline, write_wav};

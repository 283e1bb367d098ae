//! Frame-time debug overlay accounting.
//!
//! Everything here is CPU-side and renderer-agnostic: `present` feeds the
//! frame duration into [`OverlayStats`], drains the [`DebugTextQueue`] and
//! hands the [`OverlayFrame`] produced by [`compose`] to the overlay renderer.

mod compose;
mod queue;
mod stats;

pub use compose::{compose, normalized_frame_cost, BarSegment, OverlayFrame, BAR_MARGIN};
pub use queue::DebugTextQueue;
pub use stats::{FrameSample, FrameTimingRing, OverlayStats, EMA_SMOOTHING, RING_LEN};

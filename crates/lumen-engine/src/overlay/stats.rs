use std::collections::VecDeque;

/// Number of frame durations kept for the bar graph.
pub const RING_LEN: usize = 120;

/// Weight of the previous average in the moving average update.
pub const EMA_SMOOTHING: f64 = 0.9;

/// Fixed-length history of frame durations in milliseconds.
///
/// Index 0 is the newest sample. The ring starts zero-filled and its length
/// never changes: every push evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct FrameTimingRing {
    samples: VecDeque<f64>,
}

impl FrameTimingRing {
    pub fn new() -> Self {
        let mut samples = VecDeque::with_capacity(RING_LEN);
        samples.resize(RING_LEN, 0.0);
        Self { samples }
    }

    pub fn push(&mut self, dt_ms: f64) {
        self.samples.pop_back();
        self.samples.push_front(dt_ms);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.samples.get(index).copied()
    }

    /// Samples newest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

impl Default for FrameTimingRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Values displayed for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameSample {
    /// Frames per second derived from the average *before* this frame's
    /// update. `None` while the average is still zero.
    pub fps: Option<f64>,

    /// Smoothed frame duration after this frame's update, in milliseconds.
    pub avg_ms: f64,
}

impl FrameSample {
    /// FPS line, e.g. `" 60 FPS"`; `"--- FPS"` when undefined.
    pub fn fps_text(&self) -> String {
        match self.fps {
            Some(fps) => format!("{:>3} FPS", fps.round() as i64),
            None => "--- FPS".to_string(),
        }
    }

    /// Average frame time line, e.g. `"16.667 ms"`.
    pub fn avg_text(&self) -> String {
        format!("{:>6.3} ms", self.avg_ms)
    }
}

/// Moving average and history of frame durations.
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    avg_ms: f64,
    ring: FrameTimingRing,
}

impl OverlayStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one frame duration into the average and the ring.
    pub fn record(&mut self, dt_ms: f64) -> FrameSample {
        let fps = 1000.0 / self.avg_ms;
        let fps = fps.is_finite().then_some(fps);

        self.avg_ms = EMA_SMOOTHING * self.avg_ms + (1.0 - EMA_SMOOTHING) * dt_ms;
        self.ring.push(dt_ms);

        FrameSample {
            fps,
            avg_ms: self.avg_ms,
        }
    }

    #[inline]
    pub fn avg_ms(&self) -> f64 {
        self.avg_ms
    }

    #[inline]
    pub fn ring(&self) -> &FrameTimingRing {
        &self.ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_60: f64 = 1000.0 / 60.0;

    #[test]
    fn ring_starts_full_of_zeros() {
        let ring = FrameTimingRing::new();
        assert_eq!(ring.len(), RING_LEN);
        assert!(ring.iter().all(|v| v == 0.0));
    }

    #[test]
    fn ring_length_is_constant_and_newest_first() {
        let mut ring = FrameTimingRing::new();
        for i in 0..300 {
            ring.push(i as f64);
            assert_eq!(ring.len(), RING_LEN);
            assert_eq!(ring.get(0), Some(i as f64));
        }
        // Oldest retained sample is 300 - 120.
        assert_eq!(ring.get(RING_LEN - 1), Some(180.0));
        assert_eq!(ring.get(RING_LEN), None);
    }

    #[test]
    fn ema_converges_monotonically_for_constant_input() {
        let mut stats = OverlayStats::new();
        let mut prev = stats.avg_ms();
        for _ in 0..200 {
            let sample = stats.record(FRAME_60);
            assert!(sample.avg_ms >= prev);
            assert!(sample.avg_ms <= FRAME_60 + 1e-9);
            prev = sample.avg_ms;
        }
        assert!((prev - FRAME_60).abs() < 1e-6);
    }

    #[test]
    fn ema_after_three_frames() {
        let mut stats = OverlayStats::new();
        for _ in 0..3 {
            stats.record(FRAME_60);
        }
        let expected = (1.0 - EMA_SMOOTHING.powi(3)) * FRAME_60;
        assert!((stats.avg_ms() - expected).abs() < 1e-9);
        assert!((stats.avg_ms() - 4.5167).abs() < 1e-3);
    }

    #[test]
    fn first_frame_fps_is_undefined() {
        let mut stats = OverlayStats::new();
        let first = stats.record(FRAME_60);
        assert_eq!(first.fps, None);
        assert_eq!(first.fps_text(), "--- FPS");

        let second = stats.record(FRAME_60);
        let fps = second.fps.unwrap();
        assert!((fps - 600.0).abs() < 1e-6);
    }

    #[test]
    fn fps_uses_average_from_before_the_update() {
        let mut stats = OverlayStats::new();
        for _ in 0..12 {
            stats.record(FRAME_60);
        }
        let before = stats.avg_ms();
        assert!((before - 11.9595).abs() < 1e-3);

        let next = stats.record(FRAME_60);
        assert!((next.fps.unwrap() - 1000.0 / before).abs() < 1e-9);
        assert_eq!(next.fps_text(), " 84 FPS");
    }

    #[test]
    fn text_lines_are_padded() {
        let sample = FrameSample {
            fps: Some(59.6),
            avg_ms: 16.66667,
        };
        assert_eq!(sample.fps_text(), " 60 FPS");
        assert_eq!(sample.avg_text(), "16.667 ms");

        let small = FrameSample {
            fps: Some(1234.0),
            avg_ms: 0.5,
        };
        assert_eq!(small.fps_text(), "1234 FPS");
        assert_eq!(small.avg_text(), " 0.500 ms");
    }
}

//! Fractal view state.

pub const DEFAULT_CENTER: [f64; 2] = [-0.5, 0.0];
pub const DEFAULT_SCALE: f64 = 3.0;
pub const DEFAULT_ITERATIONS: i32 = 128;

pub const MIN_ITERATIONS: i32 = 16;
pub const MAX_ITERATIONS: i32 = 4096;
pub const ITERATION_STEP: i32 = 32;

/// Scale factor applied per wheel line; positive lines zoom in.
pub const ZOOM_PER_LINE: f64 = 0.9;

/// Mutable state of the fractal demo, threaded through every frame.
///
/// Positions are in backing-surface pixels with the origin at the top-left;
/// the complex plane has imaginary up.
#[derive(Debug, Clone, PartialEq)]
pub struct FractalSession {
    pub mouse: Option<(f32, f32)>,
    pub mouse_delta: (f32, f32),
    /// Complex-plane point shown at the surface center.
    pub center: [f64; 2],
    /// Height of the visible region in complex units.
    pub scale: f64,
    pub iterations: i32,
    /// Timestamp of the first frame after a reset, in seconds.
    pub start_time: Option<f64>,
}

impl Default for FractalSession {
    fn default() -> Self {
        Self {
            mouse: None,
            mouse_delta: (0.0, 0.0),
            center: DEFAULT_CENTER,
            scale: DEFAULT_SCALE,
            iterations: DEFAULT_ITERATIONS,
            start_time: None,
        }
    }
}

impl FractalSession {
    pub fn reset_state(&mut self) {
        *self = Self {
            mouse: self.mouse,
            ..Self::default()
        };
    }

    /// Seconds since the session (re)started; anchors on the first call.
    pub fn elapsed(&mut self, now: f64) -> f64 {
        now - *self.start_time.get_or_insert(now)
    }

    fn units_per_pixel(&self, surface_height: f32) -> f64 {
        self.scale / surface_height as f64
    }

    /// Complex-plane coordinates of a surface pixel.
    pub fn to_plane(&self, pos: (f32, f32), surface: (f32, f32)) -> [f64; 2] {
        let k = self.units_per_pixel(surface.1);
        let dx = (pos.0 - surface.0 * 0.5) as f64;
        let dy = (pos.1 - surface.1 * 0.5) as f64;
        [self.center[0] + dx * k, self.center[1] - dy * k]
    }

    /// Moves the view so the plane follows a pointer drag of `delta` pixels.
    pub fn pan_by(&mut self, delta: (f32, f32), surface_height: f32) {
        let k = self.units_per_pixel(surface_height);
        self.center[0] -= delta.0 as f64 * k;
        self.center[1] += delta.1 as f64 * k;
    }

    /// Zooms by `lines` wheel steps keeping the plane point under `anchor` fixed.
    pub fn zoom_at(&mut self, lines: f32, anchor: (f32, f32), surface: (f32, f32)) {
        if lines == 0.0 {
            return;
        }

        let before = self.to_plane(anchor, surface);
        self.scale *= ZOOM_PER_LINE.powf(lines as f64);
        let after = self.to_plane(anchor, surface);

        self.center[0] += before[0] - after[0];
        self.center[1] += before[1] - after[1];
    }

    pub fn adjust_iterations(&mut self, steps: i32) {
        self.iterations = (self.iterations + steps * ITERATION_STEP).clamp(MIN_ITERATIONS, MAX_ITERATIONS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: (f32, f32) = (400.0, 300.0);

    fn close(a: [f64; 2], b: [f64; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
    }

    #[test]
    fn surface_center_maps_to_view_center() {
        let s = FractalSession::default();
        assert!(close(s.to_plane((200.0, 150.0), SURFACE), DEFAULT_CENTER));
    }

    #[test]
    fn plane_y_points_up() {
        let s = FractalSession::default();
        let top = s.to_plane((200.0, 0.0), SURFACE);
        assert!((top[1] - DEFAULT_SCALE / 2.0).abs() < 1e-9);
    }

    #[test]
    fn dragging_keeps_point_under_pointer() {
        let mut s = FractalSession::default();
        let grabbed = s.to_plane((100.0, 100.0), SURFACE);

        s.pan_by((30.0, -20.0), SURFACE.1);

        assert!(close(s.to_plane((130.0, 80.0), SURFACE), grabbed));
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut s = FractalSession::default();
        let anchor = (320.0, 60.0);
        let before = s.to_plane(anchor, SURFACE);

        s.zoom_at(3.0, anchor, SURFACE);

        assert!(s.scale < DEFAULT_SCALE);
        assert!(close(s.to_plane(anchor, SURFACE), before));
    }

    #[test]
    fn zoom_out_on_negative_lines() {
        let mut s = FractalSession::default();
        s.zoom_at(-1.0, (0.0, 0.0), SURFACE);
        assert!((s.scale - DEFAULT_SCALE / ZOOM_PER_LINE).abs() < 1e-9);
    }

    #[test]
    fn iterations_are_clamped() {
        let mut s = FractalSession::default();
        s.adjust_iterations(1);
        assert_eq!(s.iterations, DEFAULT_ITERATIONS + ITERATION_STEP);

        s.adjust_iterations(-1000);
        assert_eq!(s.iterations, MIN_ITERATIONS);

        s.adjust_iterations(1000);
        assert_eq!(s.iterations, MAX_ITERATIONS);
    }

    #[test]
    fn reset_restores_view_and_restarts_time() {
        let mut s = FractalSession::default();
        assert_eq!(s.elapsed(5.0), 0.0);
        assert_eq!(s.elapsed(7.5), 2.5);

        s.mouse = Some((1.0, 2.0));
        s.pan_by((10.0, 10.0), SURFACE.1);
        s.zoom_at(2.0, (0.0, 0.0), SURFACE);
        s.adjust_iterations(2);

        s.reset_state();

        assert_eq!(s.center, DEFAULT_CENTER);
        assert_eq!(s.scale, DEFAULT_SCALE);
        assert_eq!(s.iterations, DEFAULT_ITERATIONS);
        assert_eq!(s.mouse, Some((1.0, 2.0)));
        assert_eq!(s.elapsed(9.0), 0.0);
    }
}

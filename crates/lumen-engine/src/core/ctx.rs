use crate::input::{InputFrame, InputState};
use crate::surface::RenderSurface;
use crate::time::FrameTime;

/// Per-frame context passed to `Demo::frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `RenderSurface<'w>`
pub struct FrameCtx<'a, 'w> {
    pub surface: &'a mut RenderSurface<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    /// Timestamp and previous frame duration, in seconds.
    pub time: FrameTime,
    exit: &'a mut bool,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    pub(crate) fn new(
        surface: &'a mut RenderSurface<'w>,
        input: &'a InputState,
        input_frame: &'a InputFrame,
        time: FrameTime,
        exit: &'a mut bool,
    ) -> Self {
        Self {
            surface,
            input,
            input_frame,
            time,
            exit,
        }
    }

    /// Stops the loop after this frame is presented.
    pub fn exit(&mut self) {
        *self.exit = true;
    }

    /// Pointer position in backing-surface pixels, if the pointer is over
    /// the window.
    pub fn pointer_on_surface(&self) -> Option<(f32, f32)> {
        let scale = self.surface.size().scale();
        self.input
            .pointer_pos
            .map(|(x, y)| (x / scale, y / scale))
    }

    /// Pointer movement this frame in backing-surface pixels.
    pub fn pointer_delta_on_surface(&self) -> (f32, f32) {
        let scale = self.surface.size().scale();
        let (dx, dy) = self.input_frame.pointer_delta;
        (dx / scale, dy / scale)
    }
}

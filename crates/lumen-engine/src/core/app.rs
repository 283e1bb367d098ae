use crate::input::InputEvent;
use crate::surface::RenderSurface;

use super::ctx::FrameCtx;

/// Control directive returned by input callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// A program driven by the runtime: set up once, then called every frame.
pub trait Demo {
    /// Compiles programs and declares vertex state. Runs once, after the
    /// surface is ready and before the first frame; an error aborts startup.
    fn setup(&mut self, surface: &mut RenderSurface<'_>) -> anyhow::Result<()>;

    /// Called for every translated input event, before the next frame.
    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Draws one frame. An error stops the loop and is returned from
    /// `Runtime::run`.
    fn frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> anyhow::Result<()>;
}

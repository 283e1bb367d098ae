use lumen_engine::core::{AppControl, Demo, FrameCtx};
use lumen_engine::input::InputEvent;
use lumen_engine::program::Program;
use lumen_engine::surface::RenderSurface;

use super::escape_pressed;
use super::triangle::TriangleScene;

/// Default scale for this demo when none is given on the command line.
pub const DEFAULT_SCALE: f32 = 4.0;

/// Lines describing a linked program's interface, one per attribute and
/// uniform.
pub fn interface_lines(program: &Program) -> Vec<String> {
    let mut lines = Vec::new();

    for attr in program.attributes() {
        lines.push(format!(
            "in  @{} {}: {}f",
            attr.location, attr.name, attr.components
        ));
    }

    for slot in program.uniforms() {
        lines.push(format!(
            "uni #{}+{} {}: {}",
            slot.binding, slot.offset, slot.name, slot.kind
        ));
    }

    lines
}

/// The rotating triangle drawn into a low-resolution backing surface and
/// upscaled onto the window, with the program interface listed in the
/// overlay.
#[derive(Default)]
pub struct CompositeDemo {
    scene: Option<TriangleScene>,
    interface: Vec<String>,
}

impl Demo for CompositeDemo {
    fn setup(&mut self, surface: &mut RenderSurface<'_>) -> anyhow::Result<()> {
        let scene = TriangleScene::new(surface)?;
        self.interface = interface_lines(scene.program());

        let size = surface.size();
        log::info!(
            "compositing {}x{} onto {}x{}",
            size.device_width(),
            size.device_height(),
            size.display_width(),
            size.display_height()
        );

        self.scene = Some(scene);
        Ok(())
    }

    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        if escape_pressed(event) {
            AppControl::Exit
        } else {
            AppControl::Continue
        }
    }

    fn frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> anyhow::Result<()> {
        let Some(scene) = self.scene.as_mut() else {
            anyhow::bail!("composite demo drawn before setup");
        };

        scene.draw(ctx.surface, ctx.time.time)?;

        let size = ctx.surface.size();
        ctx.surface.debug_text(format!(
            "{}x{} x{}",
            size.device_width(),
            size.device_height(),
            size.scale()
        ));
        for line in &self.interface {
            ctx.surface.debug_text(line.clone());
        }

        Ok(())
    }
}

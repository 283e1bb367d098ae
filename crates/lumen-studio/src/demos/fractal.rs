use lumen_engine::core::{AppControl, Demo, FrameCtx};
use lumen_engine::input::{InputEvent, Key, MouseButton};
use lumen_engine::program::{DrawParams, PrimitiveMode, Program, UniformValue, VertexState};
use lumen_engine::surface::RenderSurface;
use lumen_engine::ShaderStage;

use super::escape_pressed;
use crate::session::FractalSession;

const VS: &str = include_str!("../shaders/fractal_vs.wgsl");
const FS: &str = include_str!("../shaders/fractal_fs.wgsl");

/// Clip-space quad as a triangle strip.
const QUAD: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

struct Gpu {
    program: Program,
    quad: VertexState,
}

/// Escape-time Mandelbrot set.
///
/// Left-drag pans, the wheel zooms around the pointer, `+`/`-` change the
/// iteration count, `Space` resets the view and `Escape` exits.
#[derive(Default)]
pub struct FractalDemo {
    gpu: Option<Gpu>,
    session: FractalSession,
}

impl FractalDemo {
    fn update(&mut self, ctx: &FrameCtx<'_, '_>) {
        let size = ctx.surface.size();
        let surface = (size.device_width() as f32, size.device_height() as f32);
        let frame = ctx.input_frame;
        let session = &mut self.session;

        session.mouse = ctx.pointer_on_surface();
        session.mouse_delta = ctx.pointer_delta_on_surface();

        if ctx.input.button_down(MouseButton::Left) {
            session.pan_by(session.mouse_delta, surface.1);
        }

        if frame.wheel_lines != 0.0 {
            let anchor = session.mouse.unwrap_or((surface.0 * 0.5, surface.1 * 0.5));
            session.zoom_at(frame.wheel_lines, anchor, surface);
        }

        if frame.key_pressed(Key::Equal) || frame.key_pressed(Key::NumpadAdd) {
            session.adjust_iterations(1);
        }
        if frame.key_pressed(Key::Minus) || frame.key_pressed(Key::NumpadSubtract) {
            session.adjust_iterations(-1);
        }
        if frame.key_pressed(Key::Space) {
            log::info!("fractal view reset");
            session.reset_state();
        }
    }
}

impl Demo for FractalDemo {
    fn setup(&mut self, surface: &mut RenderSurface<'_>) -> anyhow::Result<()> {
        let vs = surface.compile_shader(ShaderStage::Vertex, VS)?;
        let fs = surface.compile_shader(ShaderStage::Fragment, FS)?;
        let program = surface.link_program(&[&vs, &fs])?;

        let quad = surface.declare_vertex_state(&program, |b| b.buffer("in_position", 2, &QUAD))?;

        self.gpu = Some(Gpu { program, quad });
        self.session.reset_state();
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
        self.update(ctx);

        let Some(gpu) = self.gpu.as_mut() else {
            anyhow::bail!("fractal demo drawn before setup");
        };
        let session = &mut self.session;
        let elapsed = session.elapsed(ctx.time.time);

        let size = ctx.surface.size();
        let surface = &mut *ctx.surface;
        let program = &mut gpu.program;

        surface.set_uniform(
            program,
            "center",
            UniformValue::Vec2([session.center[0] as f32, session.center[1] as f32]),
        )?;
        surface.set_uniform(
            program,
            "resolution",
            UniformValue::Vec2([size.device_width() as f32, size.device_height() as f32]),
        )?;
        surface.set_uniform(program, "scale", UniformValue::Float(session.scale as f32))?;
        surface.set_uniform(program, "iterations", UniformValue::Int(session.iterations))?;
        surface.set_uniform(program, "time", UniformValue::Float(elapsed as f32))?;

        surface.draw(
            program,
            &gpu.quad,
            DrawParams::new(4).mode(PrimitiveMode::TriangleStrip),
        )?;

        surface.debug_text(format!("zoom {:.3e}", crate::session::DEFAULT_SCALE / session.scale));
        surface.debug_text(format!("iter {}", session.iterations));
        if let Some((x, y)) = session.mouse {
            let p = session.to_plane((x, y), (size.device_width() as f32, size.device_height() as f32));
            surface.debug_text(format!("{:+.6} {:+.6}i", p[0], p[1]));
        }

        Ok(())
    }
}

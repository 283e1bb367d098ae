use lumen_engine::core::{AppControl, Demo, FrameCtx};
use lumen_engine::input::InputEvent;
use lumen_engine::program::{DrawParams, Program, UniformValue, VertexState};
use lumen_engine::surface::RenderSurface;
use lumen_engine::ShaderStage;

use super::escape_pressed;

const VS: &str = include_str!("../shaders/triangle_vs.wgsl");
const FS: &str = include_str!("../shaders/triangle_fs.wgsl");

/// Rotation speed of the scene in radians per second.
pub const ANGULAR_SPEED: f64 = 0.5;

/// Equilateral triangle centered on its centroid, apex down.
pub fn triangle_positions() -> [f32; 6] {
    let cos60 = -0.5f32;
    let sin60 = -0.5 * 3f32.sqrt();
    [
        0.0,
        sin60 - sin60 / 3.0,
        cos60,
        -sin60 / 3.0,
        -cos60,
        -sin60 / 3.0,
    ]
}

pub const TRIANGLE_COLORS: [f32; 9] = [
    1.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, //
    0.0, 0.0, 1.0,
];

/// Column-major rotation about the z axis.
pub fn rotation_z(angle: f64) -> [[f32; 4]; 4] {
    let (s, c) = angle.sin_cos();
    let (s, c) = (s as f32, c as f32);
    [
        [c, s, 0.0, 0.0],
        [-s, c, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Program and vertex state for the rotating triangle.
pub struct TriangleScene {
    program: Program,
    vertices: VertexState,
}

impl TriangleScene {
    pub fn new(surface: &RenderSurface<'_>) -> anyhow::Result<Self> {
        let vs = surface.compile_shader(ShaderStage::Vertex, VS)?;
        let fs = surface.compile_shader(ShaderStage::Fragment, FS)?;
        let program = surface.link_program(&[&fs, &vs])?;

        let vertices = surface.declare_vertex_state(&program, |b| {
            b.buffer("in_position", 2, &triangle_positions())?;
            b.buffer("in_color", 3, &TRIANGLE_COLORS)
        })?;

        Ok(Self { program, vertices })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn draw(&mut self, surface: &mut RenderSurface<'_>, time: f64) -> anyhow::Result<()> {
        let transform = rotation_z(time * ANGULAR_SPEED);
        surface.set_uniform(&mut self.program, "transform", UniformValue::Mat4(transform))?;
        surface.draw(&mut self.program, &self.vertices, DrawParams::new(3))?;
        Ok(())
    }
}

/// A vertex-colored triangle rotating at half a radian per second.
#[derive(Default)]
pub struct TriangleDemo {
    scene: Option<TriangleScene>,
}

impl Demo for TriangleDemo {
    fn setup(&mut self, surface: &mut RenderSurface<'_>) -> anyhow::Result<()> {
        self.scene = Some(TriangleScene::new(surface)?);
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
            anyhow::bail!("triangle demo drawn before setup");
        };
        scene.draw(ctx.surface, ctx.time.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_is_centered() {
        let p = triangle_positions();
        let cx = (p[0] + p[2] + p[4]) / 3.0;
        let cy = (p[1] + p[3] + p[5]) / 3.0;
        assert!(cx.abs() < 1e-6);
        assert!(cy.abs() < 1e-6);
        assert!(p[1] < p[3]);
    }

    #[test]
    fn rotation_quarter_turn() {
        let m = rotation_z(std::f64::consts::FRAC_PI_2);
        // x axis maps to y axis
        assert!(m[0][0].abs() < 1e-6);
        assert!((m[0][1] - 1.0).abs() < 1e-6);
        assert!((m[1][0] + 1.0).abs() < 1e-6);
        assert_eq!(m[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn rotation_identity_at_zero() {
        let m = rotation_z(0.0);
        assert_eq!(m[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(m[1], [0.0, 1.0, 0.0, 0.0]);
    }
}

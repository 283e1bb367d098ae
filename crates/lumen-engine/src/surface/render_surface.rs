use winit::window::Window;

use crate::device::{Acquired, Gpu, GpuInit};
use crate::driver::FrameTarget;
use crate::error::{HarnessError, Result, ShaderStage};
use crate::overlay::{compose, DebugTextQueue, OverlayStats, BAR_MARGIN};
use crate::program::{
    compile_shader, link, DrawParams, Program, Shader, UniformValue, VertexBinder, VertexState,
};
use crate::render::{BarRenderer, BlitRenderer, RenderCtx, TextBlock, TextRenderer};
use crate::text::{FontId, FontSystem};

use super::{OverlayConfig, SurfaceConfig, SurfaceSize, UniformPolicy};

/// Format of the backing surface every program renders into.
pub const BACKING_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const OVERLAY_TEXT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Overlay renderers and their font.
struct Overlay {
    bars: BarRenderer,
    text: TextRenderer,
    fonts: FontSystem,
    font: Option<FontId>,
    font_size: f32,
}

impl Overlay {
    fn new(config: &OverlayConfig) -> Self {
        let mut fonts = FontSystem::new();
        let font = match &config.font_path {
            Some(path) => match fonts.load_file(path) {
                Ok(id) => Some(id),
                Err(e) => {
                    log::warn!("{e}; falling back to a system font");
                    fonts.load_system_monospace()
                }
            },
            None => fonts.load_system_monospace(),
        };
        if font.is_none() {
            log::warn!("no monospace font found; overlay shows the frame graph only");
        }

        Self {
            bars: BarRenderer::new(),
            text: TextRenderer::new(),
            fonts,
            font,
            font_size: config.font_size,
        }
    }
}

/// A fixed-size drawing surface bound to a window.
///
/// Draw calls render into an offscreen backing texture of the device size.
/// `present` composites it onto the window (each backing pixel becomes a
/// `scale × scale` block), draws the frame-time overlay on top and presents.
pub struct RenderSurface<'w> {
    gpu: Gpu<'w>,
    window: &'w Window,
    size: SurfaceSize,
    policy: UniformPolicy,

    _backing: wgpu::Texture,
    backing_view: wgpu::TextureView,

    /// Commands for the frame in progress; opened by `clear` or the first draw.
    encoder: Option<wgpu::CommandEncoder>,

    blit: BlitRenderer,
    overlay: Option<Overlay>,
    stats: OverlayStats,
    debug_text: DebugTextQueue,
}

impl<'w> RenderSurface<'w> {
    /// Acquires the GPU context for `window` and allocates the backing surface.
    ///
    /// The window is expected to already have the display size of `size`.
    pub fn new(
        window: &'w Window,
        size: SurfaceSize,
        config: &SurfaceConfig,
        init: GpuInit,
    ) -> Result<Self> {
        let gpu = pollster::block_on(Gpu::new(window, init))
            .map_err(HarnessError::ContextAcquisition)?;

        let backing = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen backing surface"),
            size: wgpu::Extent3d {
                width: size.device_width(),
                height: size.device_height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: BACKING_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let backing_view = backing.create_view(&wgpu::TextureViewDescriptor::default());

        let overlay = config.overlay.enabled.then(|| Overlay::new(&config.overlay));

        log::info!(
            "render surface ready: {}x{} device px at scale {}",
            size.device_width(),
            size.device_height(),
            size.scale()
        );

        Ok(Self {
            gpu,
            window,
            size,
            policy: config.uniform_policy,
            _backing: backing,
            backing_view,
            encoder: None,
            blit: BlitRenderer::new(),
            overlay,
            stats: OverlayStats::new(),
            debug_text: DebugTextQueue::new(),
        })
    }

    #[inline]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    #[inline]
    pub fn window(&self) -> &'w Window {
        self.window
    }

    #[inline]
    pub fn uniform_policy(&self) -> UniformPolicy {
        self.policy
    }

    #[inline]
    pub fn stats(&self) -> &OverlayStats {
        &self.stats
    }

    #[inline]
    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    pub fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Shader> {
        compile_shader(stage, source)
    }

    /// Links `shaders` and creates the program's GPU objects.
    pub fn link_program(&self, shaders: &[&Shader]) -> Result<Program> {
        let interface = link(shaders)?;
        log::info!(
            "linked program ({} attributes, {} uniforms)",
            interface.attributes().len(),
            interface.uniforms().len()
        );
        Ok(Program::new(self.gpu.device(), interface, BACKING_FORMAT))
    }

    /// Runs `bind` against `program` and returns the uploaded attribute buffers.
    pub fn declare_vertex_state<F>(&self, program: &Program, bind: F) -> Result<VertexState>
    where
        F: FnOnce(&mut VertexBinder<'_>) -> Result<()>,
    {
        let mut binder = VertexBinder::new(self.gpu.device(), program.interface(), self.policy);
        bind(&mut binder)?;
        Ok(binder.finish())
    }

    /// Sets a uniform for subsequent draws with `program`.
    pub fn set_uniform(&self, program: &mut Program, name: &str, value: UniformValue) -> Result<()> {
        program.set_uniform(name, value, self.policy)
    }

    /// Records one draw into the backing surface.
    pub fn draw(&mut self, program: &mut Program, state: &VertexState, params: DrawParams) -> Result<()> {
        let device = self.gpu.device();
        let encoder = self.encoder.get_or_insert_with(|| new_encoder(device));
        program.record_draw(device, encoder, &self.backing_view, state, &params)
    }

    /// Queues a line for this frame's overlay.
    pub fn debug_text(&mut self, text: impl Into<String>) {
        self.debug_text.push(text);
    }

    /// Starts a frame by clearing the backing surface to transparent black.
    pub fn clear(&mut self) -> Result<()> {
        if self.encoder.is_some() {
            log::trace!("discarding commands recorded outside a frame");
        }
        let mut encoder = new_encoder(self.gpu.device());
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lumen clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.backing_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.encoder = Some(encoder);
        Ok(())
    }

    /// Composites the backing surface, draws the overlay and presents.
    ///
    /// The debug text queue is emptied even when the frame is skipped.
    pub fn present(&mut self, time_s: f64, delta_ms: f64) -> Result<()> {
        let sample = self.stats.record(delta_ms);
        let lines = self.debug_text.drain();

        let mut encoder = self
            .encoder
            .take()
            .unwrap_or_else(|| new_encoder(self.gpu.device()));

        let frame = match self.gpu.acquire() {
            Acquired::Frame(frame) => frame,
            Acquired::Lost(err) => return Err(HarnessError::SurfaceLost(err.to_string())),
            Acquired::Skipped(err) => {
                log::warn!("frame at {time_s:.3}s skipped: {err}");
                // Backing-surface draws still execute.
                self.gpu.queue().submit(std::iter::once(encoder.finish()));
                return Ok(());
            }
        };

        let ctx = RenderCtx::for_gpu(&self.gpu);
        self.blit.render(&ctx, &mut encoder, &frame.view, &self.backing_view);

        if let Some(overlay) = self.overlay.as_mut() {
            let (w, h) = (self.size.device_width(), self.size.device_height());
            let composed = compose(&self.stats, &sample, w, h, lines);

            // Physical pixels per backing pixel.
            let unit = ctx.size_px[0] / w as f32;
            overlay
                .bars
                .render(&ctx, &mut encoder, &frame.view, &composed.bars, unit);

            if let Some(font) = overlay.font {
                let margin = BAR_MARGIN as f32 * unit;
                let block = TextBlock {
                    lines: &composed.lines,
                    font,
                    origin: [margin, margin],
                    px: overlay.font_size * unit,
                    color: OVERLAY_TEXT_COLOR,
                };
                overlay
                    .text
                    .render(&ctx, &mut encoder, &frame.view, &overlay.fonts, &block);
            }
        }

        self.window.pre_present_notify();
        self.gpu.present(frame, encoder);
        Ok(())
    }
}

impl FrameTarget for RenderSurface<'_> {
    fn clear(&mut self) -> Result<()> {
        RenderSurface::clear(self)
    }

    fn present(&mut self, time_s: f64, delta_ms: f64) -> Result<()> {
        RenderSurface::present(self, time_s, delta_ms)
    }
}

fn new_encoder(device: &wgpu::Device) -> wgpu::CommandEncoder {
    device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("lumen frame encoder"),
    })
}

/// A swapchain image ready to be recorded into.
///
/// Acquisition of the next image blocks while this is alive; hand it back
/// through `Gpu::present` within the same frame.
pub struct SwapchainFrame {
    pub texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

/// Outcome of asking the swapchain for the next image.
pub enum Acquired {
    Frame(SwapchainFrame),
    /// No image this frame. Lost or outdated surfaces have already been
    /// reconfigured; timeouts just pass.
    Skipped(wgpu::SurfaceError),
    /// The surface cannot recover (out of memory).
    Lost(wgpu::SurfaceError),
}

/// GPU context options.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// FIFO paces the frame loop to the display refresh.
    pub present_mode: wgpu::PresentMode,

    /// Pick an sRGB swapchain format when one exists.
    ///
    /// Off by default: shader output is shown unconverted, as on a canvas.
    pub prefer_srgb: bool,

    pub power_preference: wgpu::PowerPreference,

    /// Use a software adapter (e.g. headless CI machines).
    pub force_fallback_adapter: bool,

    pub limits: wgpu::Limits,

    /// Swapchain images queued ahead of the display (a hint).
    pub frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            present_mode: wgpu::PresentMode::Fifo,
            prefer_srgb: false,
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            limits: wgpu::Limits::default(),
            frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// Vsync on paces frames to the display; off lets the loop run as fast as
    /// the GPU allows (tearing permitted).
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_toggles_present_mode() {
        let init = GpuInit::default().with_vsync(false);
        assert_eq!(init.present_mode, wgpu::PresentMode::AutoNoVsync);
        assert!(!init.prefer_srgb);

        let init = init.with_vsync(true);
        assert_eq!(init.present_mode, wgpu::PresentMode::AutoVsync);
    }
}

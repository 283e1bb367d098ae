use crate::error::{HarnessError, Result};

/// Fixed pixel dimensions of a render surface.
///
/// `device_*` is the size of the backing surface that draw calls target;
/// `display_*` is the size the surface is shown at (`scale × device`), in
/// logical window pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceSize {
    device_width: u32,
    device_height: u32,
    scale: f32,
}

impl SurfaceSize {
    /// Derives the device size as `floor(width / scale) × floor(height / scale)`.
    pub fn new(width: f32, height: f32, scale: f32) -> Result<Self> {
        let invalid = || HarnessError::InvalidSurfaceSize {
            width,
            height,
            scale,
        };

        if !(scale.is_finite() && scale > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(invalid());
        }

        let device_width = (width / scale).floor();
        let device_height = (height / scale).floor();
        if device_width < 1.0 || device_height < 1.0 {
            return Err(invalid());
        }

        Ok(Self {
            device_width: device_width as u32,
            device_height: device_height as u32,
            scale,
        })
    }

    #[inline]
    pub fn device_width(&self) -> u32 {
        self.device_width
    }

    #[inline]
    pub fn device_height(&self) -> u32 {
        self.device_height
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn display_width(&self) -> f32 {
        self.scale * self.device_width as f32
    }

    #[inline]
    pub fn display_height(&self) -> f32 {
        self.scale * self.device_height as f32
    }
}

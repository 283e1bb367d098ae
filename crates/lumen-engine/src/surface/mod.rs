//! Render surface: backing texture, shader programs, draw calls and the
//! debug overlay, over a window-bound GPU context.

mod config;
mod render_surface;
mod size;

pub use config::{OverlayConfig, SurfaceConfig, UniformPolicy};
pub use render_surface::{RenderSurface, BACKING_FORMAT};
pub use size::SurfaceSize;

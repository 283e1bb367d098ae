//! GPU rendering backends for the render surface.
//!
//! - `BlitRenderer` composites the backing surface onto the swapchain.
//! - `BarRenderer` and `TextRenderer` draw the debug overlay on top.
//!
//! Overlay geometry is in physical swapchain pixels (top-left origin, +Y
//! down); vertex shaders convert to NDC using a viewport uniform.

mod bars;
mod blit;
mod common;
mod text;

pub use bars::BarRenderer;
pub use blit::BlitRenderer;
pub use common::RenderCtx;
pub use text::{TextBlock, TextRenderer};

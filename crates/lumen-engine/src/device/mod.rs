//! GPU device + swapchain management.
//!
//! Creates the wgpu Instance/Adapter/Device/Queue for a window, configures
//! its swapchain once, and hands out swapchain images frame by frame.

mod frame;
mod gpu;
mod init;
mod surface;

pub use frame::{Acquired, SwapchainFrame};
pub use gpu::Gpu;
pub use init::GpuInit;

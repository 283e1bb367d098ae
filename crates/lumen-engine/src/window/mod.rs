//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the render
//! surface and frame driver.

mod runtime;

pub use runtime::Runtime;

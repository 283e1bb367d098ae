//! Lumen engine crate.
//!
//! A small harness for real-time shader demos: a fixed-size render surface
//! with shader/program/vertex plumbing, a frame driver that ticks it, and a
//! debug overlay with a frame-time graph and per-frame text.

pub mod core;
pub mod device;
pub mod driver;
pub mod error;
pub mod input;
pub mod logging;
pub mod overlay;
pub mod program;
pub mod render;
pub mod surface;
pub mod text;
pub mod time;
pub mod window;

pub use error::{HarnessError, Result, ShaderStage};

//! Contracts between the runtime and demos.
//!
//! A [`Demo`] is set up once against the render surface, receives input
//! events, and draws through a [`FrameCtx`] every frame.

mod app;
mod ctx;

pub use app::{AppControl, Demo};
pub use ctx::FrameCtx;

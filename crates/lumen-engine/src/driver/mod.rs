//! Per-frame loop driver.

mod frame_driver;

pub use frame_driver::{FrameDriver, FrameTarget, INITIAL_DELTA_MS};

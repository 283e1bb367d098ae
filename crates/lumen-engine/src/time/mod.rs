//! Time subsystem.
//!
//! Frame timing is read through the [`Clock`] trait so the frame driver can be
//! stepped with a [`ManualClock`] in tests and a [`SystemClock`] at runtime.

mod clock;

pub use clock::{Clock, FrameTime, ManualClock, SystemClock};

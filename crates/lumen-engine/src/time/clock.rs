use std::cell::Cell;
use std::time::Instant;

/// Millisecond time source.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin. Must be monotonic.
    fn now_ms(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

/// Monotonic wall clock anchored at construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock.
///
/// Interior mutability lets a test advance time from inside a frame callback
/// while the driver holds a shared reference.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Timing values handed to the per-frame callback.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Timestamp of the tick, in seconds.
    pub time: f64,

    /// Duration of the previous tick, in seconds (one-frame lagged).
    pub delta: f64,

    /// Monotonic tick counter, starting at 0.
    pub frame_index: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(10.0);
        assert_eq!(clock.now_ms(), 10.0);
        clock.advance(6.5);
        assert_eq!(clock.now_ms(), 16.5);
        clock.set(1.0);
        assert_eq!(clock.now_ms(), 1.0);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
        assert!(a >= 0.0);
    }
}

use crate::error::{HarnessError, Result};
use crate::time::{Clock, FrameTime};

/// Frame duration assumed before the first tick has been measured.
pub const INITIAL_DELTA_MS: f64 = 1000.0 / 60.0;

/// What a tick renders into.
pub trait FrameTarget {
    /// Prepares the surface for the frame's draw calls.
    fn clear(&mut self) -> Result<()>;

    /// Finishes the frame. `delta_ms` is the previous tick's duration.
    fn present(&mut self, time_s: f64, delta_ms: f64) -> Result<()>;
}

/// Runs one frame per call to [`FrameDriver::tick`].
///
/// Each tick reads the clock, clears the target, invokes the callback with
/// `(time, delta)` in seconds, presents, and finally measures the tick so the
/// *next* callback sees this tick's duration. The first error aborts the
/// driver for good.
#[derive(Debug)]
pub struct FrameDriver<C> {
    clock: C,
    delta_ms: f64,
    frame_index: u64,
    aborted: bool,
}

impl<C: Clock> FrameDriver<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            delta_ms: INITIAL_DELTA_MS,
            frame_index: 0,
            aborted: false,
        }
    }

    /// Runs one tick.
    ///
    /// Returns `LoopAborted` once any earlier tick has failed.
    pub fn tick<T, F>(&mut self, target: &mut T, callback: F) -> Result<()>
    where
        T: FrameTarget + ?Sized,
        F: FnOnce(&mut T, FrameTime) -> anyhow::Result<()>,
    {
        if self.aborted {
            return Err(HarnessError::LoopAborted);
        }

        let result = self.run(target, callback);
        if result.is_err() {
            self.aborted = true;
            log::debug!("frame driver aborted at frame {}", self.frame_index);
        }
        result
    }

    fn run<T, F>(&mut self, target: &mut T, callback: F) -> Result<()>
    where
        T: FrameTarget + ?Sized,
        F: FnOnce(&mut T, FrameTime) -> anyhow::Result<()>,
    {
        let t = self.clock.now_ms();

        target.clear()?;

        let time = FrameTime {
            time: t / 1000.0,
            delta: self.delta_ms / 1000.0,
            frame_index: self.frame_index,
        };
        callback(target, time).map_err(HarnessError::Callback)?;

        target.present(t / 1000.0, self.delta_ms)?;

        self.frame_index += 1;
        self.delta_ms = self.clock.now_ms() - t;
        log::trace!("frame {} took {:.3} ms", self.frame_index, self.delta_ms);
        Ok(())
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Number of completed ticks.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Delta the next tick will report, in milliseconds.
    #[inline]
    pub fn delta_ms(&self) -> f64 {
        self.delta_ms
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{DebugTextQueue, OverlayStats};
    use crate::time::ManualClock;

    /// Records calls and runs the overlay accounting like the real surface.
    #[derive(Default)]
    struct FakeTarget {
        log: Vec<String>,
        presents: Vec<(f64, f64)>,
        queue: DebugTextQueue,
        rendered: Vec<Vec<String>>,
        stats: OverlayStats,
        fail_present: bool,
    }

    impl FrameTarget for FakeTarget {
        fn clear(&mut self) -> Result<()> {
            self.log.push("clear".into());
            Ok(())
        }

        fn present(&mut self, time_s: f64, delta_ms: f64) -> Result<()> {
            self.log.push("present".into());
            if self.fail_present {
                return Err(HarnessError::SurfaceLost("out of memory".into()));
            }
            self.stats.record(delta_ms);
            self.presents.push((time_s, delta_ms));
            self.rendered.push(self.queue.drain());
            Ok(())
        }
    }

    #[test]
    fn tick_order_and_lagged_delta() {
        let clock = ManualClock::new(1000.0);
        let mut driver = FrameDriver::new(&clock);
        let mut target = FakeTarget::default();
        let mut seen = Vec::new();

        for cost in [5.0, 20.0, 8.0] {
            driver
                .tick(&mut target, |t, time| {
                    t.log.push("callback".into());
                    seen.push(time);
                    clock.advance(cost);
                    Ok(())
                })
                .unwrap();
            // Idle time between ticks is not part of the next delta.
            clock.advance(100.0);
        }

        assert_eq!(&target.log[..3], ["clear", "callback", "present"]);
        assert_eq!(seen[0].time, 1.0);
        assert!((seen[0].delta - INITIAL_DELTA_MS / 1000.0).abs() < 1e-12);
        assert!((seen[1].delta - 0.005).abs() < 1e-12);
        assert!((seen[2].delta - 0.020).abs() < 1e-12);
        assert_eq!(seen[2].frame_index, 2);

        // present receives milliseconds.
        assert!((target.presents[1].1 - 5.0).abs() < 1e-12);
        assert_eq!(target.presents[1].0, 1.105);
        assert_eq!(driver.frame_index(), 3);
        assert!((driver.delta_ms() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn callback_error_aborts_the_loop() {
        let clock = ManualClock::new(0.0);
        let mut driver = FrameDriver::new(&clock);
        let mut target = FakeTarget::default();

        let err = driver
            .tick(&mut target, |_, _| Err(anyhow::anyhow!("boom")))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Callback(_)));
        assert!(err.to_string().contains("boom"));
        assert!(driver.is_aborted());

        // Failed frame is never presented.
        assert_eq!(target.log, ["clear"]);

        let mut ran = false;
        let again = driver.tick(&mut target, |_, _| {
            ran = true;
            Ok(())
        });
        assert!(matches!(again, Err(HarnessError::LoopAborted)));
        assert!(!ran);
    }

    #[test]
    fn present_error_aborts_the_loop() {
        let clock = ManualClock::new(0.0);
        let mut driver = FrameDriver::new(&clock);
        let mut target = FakeTarget {
            fail_present: true,
            ..FakeTarget::default()
        };

        let err = driver.tick(&mut target, |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, HarnessError::SurfaceLost(_)));
        assert!(matches!(
            driver.tick(&mut target, |_, _| Ok(())),
            Err(HarnessError::LoopAborted)
        ));
    }

    #[test]
    fn debug_text_does_not_leak_into_the_next_frame() {
        let clock = ManualClock::new(0.0);
        let mut driver = FrameDriver::new(&clock);
        let mut target = FakeTarget::default();

        driver
            .tick(&mut target, |t, _| {
                assert!(t.queue.is_empty());
                t.queue.push("A");
                Ok(())
            })
            .unwrap();
        driver
            .tick(&mut target, |t, _| {
                assert!(t.queue.is_empty());
                Ok(())
            })
            .unwrap();

        assert_eq!(target.rendered[0], ["A"]);
        assert!(target.rendered[1].is_empty());
    }

    #[test]
    fn three_frames_of_sixty_hz() {
        let clock = ManualClock::new(0.0);
        let mut driver = FrameDriver::new(&clock);
        let mut target = FakeTarget::default();

        for _ in 0..3 {
            driver
                .tick(&mut target, |_, _| {
                    clock.advance(1000.0 / 60.0);
                    Ok(())
                })
                .unwrap();
        }

        let expected = (1.0 - 0.9f64.powi(3)) * (1000.0 / 60.0);
        assert!((target.stats.avg_ms() - expected).abs() < 1e-9);
        let newest = target.stats.ring().get(0).unwrap();
        assert!((newest - 1000.0 / 60.0).abs() < 1e-9);
    }
}

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{AppControl, Demo, FrameCtx};
use crate::device::GpuInit;
use crate::driver::FrameDriver;
use crate::error::HarnessError;
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputFrame, InputState};
use crate::surface::{RenderSurface, SurfaceConfig, SurfaceSize};
use crate::time::SystemClock;

/// Entry point for the runtime.
///
/// Opens one fixed-size window, builds the render surface for it, runs
/// `Demo::setup` and then ticks the frame driver on every redraw until the
/// demo asks to exit, the window is closed, or a frame fails.
pub struct Runtime;

impl Runtime {
    pub fn run<D>(config: SurfaceConfig, gpu_init: GpuInit, demo: D) -> Result<()>
    where
        D: Demo + 'static,
    {
        // Validate before touching the platform so a bad size fails fast.
        let size = SurfaceSize::new(config.width, config.height, config.scale)?;

        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, size, gpu_init, demo);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,

    window: Window,

    #[borrows(window)]
    #[covariant]
    surface: RenderSurface<'this>,
}

struct AppState<D>
where
    D: Demo + 'static,
{
    config: SurfaceConfig,
    size: SurfaceSize,
    gpu_init: GpuInit,
    demo: D,

    entry: Option<WindowEntry>,
    driver: FrameDriver<SystemClock>,
    error: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<D> AppState<D>
where
    D: Demo + 'static,
{
    fn new(config: SurfaceConfig, size: SurfaceSize, gpu_init: GpuInit, demo: D) -> Self {
        Self {
            config,
            size,
            gpu_init,
            demo,
            entry: None,
            driver: FrameDriver::new(SystemClock::new()),
            error: None,
            exit_requested: false,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        if self.error.is_none() {
            self.error = Some(error);
        }
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(
                self.size.display_width() as f64,
                self.size.display_height() as f64,
            ))
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let size = self.size;
        let config = &self.config;
        let gpu_init = self.gpu_init.clone();

        let mut entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            window,
            surface_builder: |w| RenderSurface::new(w, size, config, gpu_init),
        }
        .try_build()?;

        let demo = &mut self.demo;
        entry
            .with_surface_mut(|surface| demo.setup(surface))
            .context("demo setup failed")?;

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    fn redraw(&mut self) -> std::result::Result<bool, HarnessError> {
        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (demo, driver, entry) = (&mut self.demo, &mut self.driver, &mut self.entry);

        let Some(entry) = entry.as_mut() else {
            return Ok(false);
        };

        let mut exit = false;
        let result = entry.with_mut(|fields| {
            let input = &*fields.input_state;
            let input_frame = &*fields.input_frame;

            let result = driver.tick(&mut *fields.surface, |surface, time| {
                let mut ctx = FrameCtx::new(surface, input, input_frame, time, &mut exit);
                demo.frame(&mut ctx)
            });

            // Clear per-frame deltas after the frame is consumed.
            fields.input_frame.clear();

            if result.is_ok() {
                fields.window.request_redraw();
            }
            result
        });

        result.map(|()| exit)
    }
}

impl<D> ApplicationHandler for AppState<D>
where
    D: Demo + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let (demo, entry) = (&mut self.demo, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return;
        };

        let mut control = AppControl::Continue;
        entry.with_mut(|fields| {
            if let Some(ev) = translate_window_event(fields.window, &event) {
                control = demo.on_input(&ev);
                fields.input_state.apply_event(fields.input_frame, ev);
            }
        });

        if control == AppControl::Exit {
            self.exit_requested = true;
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(true) => {
                    self.exit_requested = true;
                    event_loop.exit();
                }
                Ok(false) => {}
                Err(e) => self.fail(event_loop, e.into()),
            },

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.entry = None;
        log::debug!("runtime exiting after {} frames", self.driver.frame_index());
    }
}

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "texquad".to_string(),
            initial_size: LogicalSize::new(512.0, 512.0),
            resizable: true,
        }
    }
}

/// Main loop state.
///
/// `Running` until a close request is observed; `Closing` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Running,
    Closing,
}

impl LoopState {
    /// Transitions on a window event: only `CloseRequested` closes.
    pub fn observe(self, event: &WindowEvent) -> Self {
        match (self, event) {
            (LoopState::Running, WindowEvent::CloseRequested) => LoopState::Closing,
            (state, _) => state,
        }
    }

    /// Transitions on an app callback result.
    pub fn apply(self, control: AppControl) -> Self {
        match control {
            AppControl::Exit => LoopState::Closing,
            AppControl::Continue => self,
        }
    }

    pub fn is_running(self) -> bool {
        self == LoopState::Running
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, then drives `app` until the window is closed.
    ///
    /// Returns an error when the event loop, the window or the GPU context
    /// cannot be created.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.init_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    state: LoopState,
    init_error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            state: LoopState::Running,
            init_error: None,
        }
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        WindowEntry::try_new(window, |w| {
            pollster::block_on(Gpu::new(w, gpu_init))
                .context("failed to initialize GPU context for window")
        })
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.take().is_some() {
            log::info!("window closed");
        }
        event_loop.exit();
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || !self.state.is_running() {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.entry = Some(entry);
            }
            Err(e) => {
                log::error!("{e:#}");
                self.init_error = Some(e);
                self.state = LoopState::Closing;
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.state.is_running() {
            self.close(event_loop);
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Every frame is redrawn; there is no invalidation tracking.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if !self.state.is_running() {
            self.close(event_loop);
            return;
        }

        let control = self.app.on_window_event(&event);
        self.state = self.state.apply(control).observe(&event);

        if !self.state.is_running() {
            self.close(event_loop);
            return;
        }

        let (app, state) = (&mut self.app, &mut self.state);
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        match &event {
            WindowEvent::Resized(new_size) => {
                entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => {
                let mut control = AppControl::Continue;

                entry.with_mut(|fields| {
                    let mut ctx = FrameCtx {
                        window: WindowCtx {
                            id: window_id,
                            window: fields.window,
                        },
                        gpu: fields.gpu,
                    };
                    control = app.on_frame(&mut ctx);
                });

                *state = state.apply(control);
            }

            _ => {}
        }

        if !self.state.is_running() {
            self.close(event_loop);
        }
    }
}

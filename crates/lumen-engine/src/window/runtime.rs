use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::Renderer;
use crate::device::{RendererConfig, WgpuPlatform};
use crate::scene::{CameraSource, SceneSource};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application driven by [`Runtime`].
pub trait ViewerApp {
    /// Called for window events before the runtime handles them.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per frame before rendering, with the surface size.
    fn update(&mut self, surface_size: (u32, u32)) -> AppControl {
        let _ = surface_size;
        AppControl::Continue
    }

    /// What to draw this frame.
    fn view(&mut self) -> (&mut dyn SceneSource, &mut dyn CameraSource);
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, initializes a renderer for it and renders `app`
    /// until the window closes. Initialization failures are returned.
    pub fn run<A>(initial: RuntimeConfig, renderer_config: RendererConfig, app: A) -> Result<()>
    where
        A: ViewerApp + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(initial, renderer_config, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with an error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct WindowEntry {
    window: Arc<Window>,
    renderer: Renderer<WgpuPlatform>,
}

struct AppState<A: ViewerApp> {
    initial: RuntimeConfig,
    renderer_config: RendererConfig,
    app: A,

    entry: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A: ViewerApp> AppState<A> {
    fn new(initial: RuntimeConfig, renderer_config: RendererConfig, app: A) -> Self {
        Self {
            initial,
            renderer_config,
            app,
            entry: None,
            failure: None,
            exit_requested: false,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.initial.title.clone())
            .with_inner_size(self.initial.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let renderer = Renderer::new(
            WgpuPlatform::new(Arc::clone(&window)),
            self.renderer_config.clone(),
        );
        renderer
            .initialize_blocking()
            .context("renderer initialization failed")?;

        window.request_redraw();
        self.entry = Some(WindowEntry { window, renderer });
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut entry) = self.entry.take() {
            entry.renderer.dispose();
        }
        self.exit_requested = true;
        event_loop.exit();
    }
}

impl<A: ViewerApp> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("{e:#}");
            self.failure = Some(e);
            self.shutdown(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = &self.entry {
            entry.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.shutdown(event_loop);
            return;
        }

        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::Resized(size) => {
                entry.renderer.resize(size.width, size.height);
                entry.window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = entry.window.inner_size();
                entry.renderer.resize(size.width, size.height);
                entry.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let size = entry.renderer.surface_size().unwrap_or((1, 1));
                if self.app.update(size) == AppControl::Exit {
                    self.shutdown(event_loop);
                    return;
                }
                let (scene, camera) = self.app.view();
                entry.renderer.render(scene, camera);
            }

            _ => {}
        }
    }
}

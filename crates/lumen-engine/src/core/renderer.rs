use futures::lock::Mutex;

use crate::device::{
    AcquireError, AdapterSummary, GpuDevice, GpuPlatform, PresentSurface, RendererConfig,
    RendererInitError, SurfaceErrorAction,
};
use crate::render::FrameStats;
use crate::scene::{CameraSource, SceneSource};

use super::state::{InitializingGuard, LifecycleState, ReadyState};
use super::LifecyclePhase;

/// Renderer lifecycle: `Uninitialized -> Initializing -> Ready -> Disposed`.
///
/// `initialize` is the only async operation and the only one that locks;
/// concurrent calls converge on a single negotiation. Everything else takes
/// `&mut self` and reaches the state without locking, so `render`, `resize`
/// and `dispose` must stay on one thread.
pub struct Renderer<P: GpuPlatform> {
    platform: P,
    config: RendererConfig,
    state: Mutex<LifecycleState<P>>,
}

impl<P: GpuPlatform> Renderer<P> {
    pub fn new(platform: P, config: RendererConfig) -> Self {
        Self {
            platform,
            config,
            state: Mutex::new(LifecycleState::Uninitialized),
        }
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Negotiates device and surface. A no-op once `Ready`.
    ///
    /// On failure the renderer stays `Uninitialized` and holds nothing.
    ///
    /// # Panics
    /// If the renderer was disposed.
    pub async fn initialize(&self) -> Result<(), RendererInitError> {
        let mut state = self.state.lock().await;
        match &*state {
            LifecycleState::Ready(_) => return Ok(()),
            LifecycleState::Disposed => panic!("Renderer::initialize called after dispose"),
            LifecycleState::Uninitialized | LifecycleState::Initializing => {}
        }

        let guard = InitializingGuard::enter(&mut *state);
        let negotiated = self.platform.negotiate(&self.config).await?;
        log::info!(
            "renderer ready on {} ({}, {})",
            negotiated.adapter.backend,
            negotiated.adapter.name,
            negotiated.adapter.device_type
        );
        guard.finish(ReadyState::new(negotiated));
        Ok(())
    }

    /// Blocking variant of [`initialize`](Self::initialize).
    pub fn initialize_blocking(&self) -> Result<(), RendererInitError> {
        pollster::block_on(self.initialize())
    }

    pub fn phase(&mut self) -> LifecyclePhase {
        self.state.get_mut().phase()
    }

    pub fn adapter(&mut self) -> Option<&AdapterSummary> {
        match self.state.get_mut() {
            LifecycleState::Ready(ready) => Some(&ready.adapter),
            _ => None,
        }
    }

    pub fn frame_stats(&mut self) -> Option<FrameStats> {
        match self.state.get_mut() {
            LifecycleState::Ready(ready) => Some(ready.frame_renderer.stats()),
            _ => None,
        }
    }

    pub fn surface_size(&mut self) -> Option<(u32, u32)> {
        match self.state.get_mut() {
            LifecycleState::Ready(ready) => Some(ready.surface.size()),
            _ => None,
        }
    }

    /// Draws one frame of `scene` as seen from `camera`.
    ///
    /// A stale swapchain is reconfigured at the last known size and the
    /// frame is skipped; no error reaches the caller.
    ///
    /// # Panics
    /// If the renderer is not `Ready`.
    pub fn render<S, C>(&mut self, scene: &mut S, camera: &mut C)
    where
        S: SceneSource + ?Sized,
        C: CameraSource + ?Sized,
    {
        let clear = self.config.clear_color;
        let ready = self.ready_mut("render");

        scene.update_world_matrices();
        camera.update_world_matrix();
        let view_projection = camera.projection_matrix() * camera.view_matrix();

        ready.draw_list.clear();
        scene.collect_drawables(&mut ready.draw_list);

        let ReadyState { surface, frame_renderer, draw_list, last_size, .. } = &mut **ready;
        frame_renderer.prepare(&draw_list.meshes, &draw_list.points);

        let result = surface.present_frame(clear, &mut |pass| {
            frame_renderer.record(pass, &draw_list.meshes, &draw_list.points, view_projection);
        });

        if let Err(err) = result {
            handle_acquire_error(surface, *last_size, err);
        }
    }

    /// Resizes the surface; zero extents clamp to 1.
    ///
    /// # Panics
    /// If the renderer is not `Ready`.
    pub fn resize(&mut self, width: u32, height: u32) {
        let ready = self.ready_mut("resize");
        let size = (width.max(1), height.max(1));
        log::debug!("resize {}x{} -> {}x{}", width, height, size.0, size.1);
        ready.last_size = size;
        ready.surface.resize(size.0, size.1);
    }

    /// Releases frame resources, then the surface, then the device.
    /// Valid in any state; later calls do nothing.
    pub fn dispose(&mut self) {
        let previous = std::mem::replace(self.state.get_mut(), LifecycleState::Disposed);
        match previous {
            LifecycleState::Ready(ready) => {
                let ReadyState { device, surface, mut frame_renderer, .. } = *ready;
                frame_renderer.dispose();
                drop(frame_renderer);
                drop(surface);
                device.destroy();
                log::info!("renderer disposed");
            }
            LifecycleState::Disposed => {}
            other => log::debug!("renderer: {:?} -> disposed", other.phase()),
        }
    }

    fn ready_mut(&mut self, op: &str) -> &mut Box<ReadyState<P>> {
        match self.state.get_mut() {
            LifecycleState::Ready(ready) => ready,
            other => panic!("Renderer::{op} requires the Ready state, found {:?}", other.phase()),
        }
    }
}

impl<P: GpuPlatform> Drop for Renderer<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn handle_acquire_error<S: PresentSurface>(surface: &mut S, last_size: (u32, u32), err: AcquireError) {
    match err.action() {
        SurfaceErrorAction::Reconfigure => {
            log::debug!("surface {err:?}; reconfiguring at {}x{} and skipping frame", last_size.0, last_size.1);
            surface.resize(last_size.0, last_size.1);
        }
        SurfaceErrorAction::SkipFrame if err == AcquireError::OutOfMemory => {
            log::error!("out of memory acquiring frame; skipping");
        }
        SurfaceErrorAction::SkipFrame => {
            log::debug!("surface {err:?}; skipping frame");
        }
    }
}

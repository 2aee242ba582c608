use crate::device::{AdapterSummary, GpuPlatform, Negotiated, PresentSurface};
use crate::render::FrameRenderer;
use crate::scene::DrawList;

/// Observable lifecycle state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LifecyclePhase {
    Uninitialized,
    Initializing,
    Ready,
    Disposed,
}

/// Everything that exists only while the renderer is `Ready`.
pub(crate) struct ReadyState<P: GpuPlatform> {
    pub device: P::Device,
    pub surface: P::Surface,
    pub frame_renderer: FrameRenderer<P::Device>,
    pub adapter: AdapterSummary,
    pub draw_list: DrawList,
    /// Last size requested through `resize` (or the initial surface size).
    pub last_size: (u32, u32),
}

impl<P: GpuPlatform> ReadyState<P> {
    pub fn new(negotiated: Negotiated<P::Device, P::Surface>) -> Self {
        let Negotiated { device, surface, adapter } = negotiated;
        let frame_renderer = FrameRenderer::new(device.clone(), surface.color_format());
        let last_size = surface.size();
        Self {
            device,
            surface,
            frame_renderer,
            adapter,
            draw_list: DrawList::new(),
            last_size,
        }
    }
}

pub(crate) enum LifecycleState<P: GpuPlatform> {
    Uninitialized,
    Initializing,
    Ready(Box<ReadyState<P>>),
    Disposed,
}

impl<P: GpuPlatform> LifecycleState<P> {
    pub fn phase(&self) -> LifecyclePhase {
        match self {
            LifecycleState::Uninitialized => LifecyclePhase::Uninitialized,
            LifecycleState::Initializing => LifecyclePhase::Initializing,
            LifecycleState::Ready(_) => LifecyclePhase::Ready,
            LifecycleState::Disposed => LifecyclePhase::Disposed,
        }
    }
}

/// Puts `Initializing` back to `Uninitialized` unless the state moved on,
/// covering both failed and cancelled initialization.
pub(crate) struct InitializingGuard<'a, P: GpuPlatform> {
    state: &'a mut LifecycleState<P>,
}

impl<'a, P: GpuPlatform> InitializingGuard<'a, P> {
    pub fn enter(state: &'a mut LifecycleState<P>) -> Self {
        *state = LifecycleState::Initializing;
        log::debug!("renderer: uninitialized -> initializing");
        Self { state }
    }

    pub fn finish(self, ready: ReadyState<P>) {
        *self.state = LifecycleState::Ready(Box::new(ready));
        log::debug!("renderer: initializing -> ready");
    }
}

impl<P: GpuPlatform> Drop for InitializingGuard<'_, P> {
    fn drop(&mut self) {
        if matches!(self.state, LifecycleState::Initializing) {
            *self.state = LifecycleState::Uninitialized;
            log::debug!("renderer: initializing -> uninitialized");
        }
    }
}

//! Renderer lifecycle.
//!
//! `Renderer` is the only surface higher layers call: initialize once,
//! render and resize from the render thread, dispose at the end. Drawing
//! itself is delegated to `render::FrameRenderer`.

mod renderer;
mod state;

pub use renderer::Renderer;
pub use state::LifecyclePhase;

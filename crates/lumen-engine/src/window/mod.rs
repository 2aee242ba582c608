//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and drives a `core::Renderer`
//! bound to that window.

mod runtime;

pub use runtime::{AppControl, Runtime, RuntimeConfig, ViewerApp};

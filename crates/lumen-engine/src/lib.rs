//! Lumen engine crate.
//!
//! A small GPU scene renderer: backend negotiation and device setup
//! (`device`), cached pipelines and per-node resources (`render`), scene
//! and camera sources (`scene`), the renderer lifecycle (`core`) and a
//! winit host that drives it (`window`).

pub mod core;
pub mod device;
pub mod logging;
pub mod render;
pub mod scene;
pub mod window;

#[cfg(test)]
mod testing;

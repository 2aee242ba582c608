//! GPU device + surface management.
//!
//! This module is responsible for:
//! - backend selection and renderer configuration
//! - the backend-neutral device/surface interface (`api`)
//! - the wgpu implementation of that interface: negotiation, swapchain,
//!   per-frame acquisition and presentation

mod api;
mod backend;
mod error;
mod frame;
mod gpu;
mod init;
mod shaders;
mod surface;

pub use api::{
    AdapterSummary, BufferContents, BufferDesc, BufferUsage, DrawPass, GpuDevice, GpuPlatform,
    Negotiated, PipelineDesc, PipelineRecord, PresentSurface,
};
pub use backend::{candidate_backends, BackendKind};
pub use error::{AcquireError, ConfigError, RendererInitError, SurfaceErrorAction};
pub use frame::GpuFrame;
pub use gpu::{WgpuDevice, WgpuPlatform};
pub use init::{PowerPreference, RendererConfig, RendererConfigBuilder, SampleCount, BACKEND_ENV_VAR};
pub use shaders::{ShaderId, ShaderLibrary};
pub use surface::WgpuSurface;

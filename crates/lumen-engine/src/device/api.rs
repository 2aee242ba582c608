//! Backend-neutral device interface.
//!
//! The frame renderer and the lifecycle only see these traits. The wgpu
//! implementation lives next door; tests use a recording fake.

use std::future::Future;
use std::ops::Range;

use crate::render::{RenderState, VertexLayout};

use super::{AcquireError, BackendKind, RendererConfig, RendererInitError, ShaderId};

/// Buffer role. Every buffer is also a copy destination.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
}

/// Initial buffer contents.
#[derive(Debug, Copy, Clone)]
pub enum BufferContents<'a> {
    Init(&'a [u8]),
    Zeroed(u64),
}

impl BufferContents<'_> {
    pub fn size(&self) -> u64 {
        match self {
            BufferContents::Init(bytes) => bytes.len() as u64,
            BufferContents::Zeroed(size) => *size,
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub usage: BufferUsage,
    pub contents: BufferContents<'a>,
}

/// Everything a device needs to build one render pipeline.
#[derive(Debug, Clone)]
pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub shader: ShaderId,
    pub vertex_layout: &'a VertexLayout,
    pub topology: wgpu::PrimitiveTopology,
    pub render_state: RenderState,
    pub color_format: wgpu::TextureFormat,
}

/// A compiled pipeline and the layout of its per-node bind group.
pub struct PipelineRecord<D: GpuDevice + ?Sized> {
    pub pipeline: D::Pipeline,
    pub bind_group_layout: D::BindGroupLayout,
}

/// GPU object factory.
///
/// Handles are owned by whoever asked for them. Destruction is explicit
/// (`destroy_buffer`) so teardown order is under the caller's control.
pub trait GpuDevice: Clone + 'static {
    type Buffer: Clone + 'static;
    type BindGroupLayout;
    type BindGroup;
    type Pipeline;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> Self::Buffer;

    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    fn destroy_buffer(&self, buffer: &Self::Buffer);

    fn create_pipeline(&self, desc: &PipelineDesc<'_>) -> PipelineRecord<Self>;

    /// Bind group with a single uniform buffer at binding 0.
    fn create_uniform_bind_group(
        &self,
        layout: &Self::BindGroupLayout,
        buffer: &Self::Buffer,
        label: &str,
    ) -> Self::BindGroup;

    /// Releases the logical device. Nothing created from it may be used after.
    fn destroy(&self);
}

/// Commands recordable inside one render pass.
pub trait DrawPass<D: GpuDevice> {
    fn set_pipeline(&mut self, pipeline: &D::Pipeline);
    fn set_bind_group(&mut self, index: u32, group: &D::BindGroup);
    fn set_vertex_buffer(&mut self, slot: u32, buffer: &D::Buffer);
    fn set_index_buffer(&mut self, buffer: &D::Buffer, format: wgpu::IndexFormat);
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);
}

/// Presentable surface (swapchain).
pub trait PresentSurface {
    type Device: GpuDevice;

    /// Configured size in physical pixels.
    fn size(&self) -> (u32, u32);

    fn color_format(&self) -> wgpu::TextureFormat;

    /// Reconfigures the swapchain. Callers clamp to at least 1x1.
    fn resize(&mut self, width: u32, height: u32);

    /// Acquires the next frame, opens a single render pass cleared to
    /// `clear`, hands it to `record`, then submits and presents.
    fn present_frame(
        &mut self,
        clear: wgpu::Color,
        record: &mut dyn FnMut(&mut dyn DrawPass<Self::Device>),
    ) -> Result<(), AcquireError>;
}

/// Identity and a few limits of the negotiated adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSummary {
    pub name: String,
    pub backend: BackendKind,
    pub device_type: String,
    pub max_texture_dimension_2d: u32,
    pub max_bind_groups: u32,
}

/// Result of a successful negotiation.
pub struct Negotiated<D, S> {
    pub device: D,
    pub surface: S,
    pub adapter: AdapterSummary,
}

/// Creates device + surface for a configuration.
///
/// Each step releases what it allocated before reporting failure, so an
/// error leaves nothing behind.
pub trait GpuPlatform {
    type Device: GpuDevice;
    type Surface: PresentSurface<Device = Self::Device>;

    fn negotiate(
        &self,
        config: &RendererConfig,
    ) -> impl Future<Output = Result<Negotiated<Self::Device, Self::Surface>, RendererInitError>>;
}

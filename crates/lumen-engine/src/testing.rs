//! Recording fakes for the device interface.
//!
//! Everything is single-threaded and shares state through `Rc<RefCell<_>>`,
//! so a test can keep a handle and inspect what the code under test did.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use crate::device::{
    AcquireError, AdapterSummary, BackendKind, BufferDesc, BufferUsage, DrawPass, GpuDevice,
    GpuPlatform, Negotiated, PipelineDesc, PipelineRecord, PresentSurface, RendererConfig,
    RendererInitError, ShaderId,
};

// ── device ────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FakeBuffer(pub u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FakeLayout(pub u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FakeBindGroup(pub u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FakePipeline(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    CreateBuffer { id: u32, label: String, usage: BufferUsage, size: u64 },
    WriteBuffer { id: u32, offset: u64, data: Vec<u8> },
    DestroyBuffer { id: u32 },
    CreatePipeline { id: u32, shader: ShaderId, topology: wgpu::PrimitiveTopology },
    CreateBindGroup { id: u32, buffer: u32 },
    DestroyDevice,
}

#[derive(Debug, Default)]
struct DeviceLog {
    events: Vec<DeviceEvent>,
    next_id: u32,
}

impl DeviceLog {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    log: Rc<RefCell<DeviceLog>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.log.borrow().events.clone()
    }

    pub fn buffers_created(&self) -> usize {
        self.created_buffer_ids().len()
    }

    pub fn pipelines_created(&self) -> usize {
        self.count(|e| matches!(e, DeviceEvent::CreatePipeline { .. }))
    }

    pub fn created_buffer_ids(&self) -> Vec<u32> {
        self.log
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                DeviceEvent::CreateBuffer { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// In destruction order.
    pub fn destroyed_buffer_ids(&self) -> Vec<u32> {
        self.log
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                DeviceEvent::DestroyBuffer { id } => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Last data written to `buffer`, as `f32`s.
    pub fn last_write(&self, buffer: FakeBuffer) -> Option<Vec<f32>> {
        self.log.borrow().events.iter().rev().find_map(|e| match e {
            DeviceEvent::WriteBuffer { id, data, .. } if *id == buffer.0 => {
                Some(
                    data.chunks_exact(4)
                        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                        .collect(),
                )
            }
            _ => None,
        })
    }

    pub fn is_destroyed(&self) -> bool {
        self.count(|e| matches!(e, DeviceEvent::DestroyDevice)) > 0
    }

    fn count(&self, pred: impl Fn(&DeviceEvent) -> bool) -> usize {
        self.log.borrow().events.iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: DeviceEvent) {
        self.log.borrow_mut().events.push(event);
    }

    fn next_id(&self) -> u32 {
        self.log.borrow_mut().next()
    }
}

impl GpuDevice for FakeDevice {
    type Buffer = FakeBuffer;
    type BindGroupLayout = FakeLayout;
    type BindGroup = FakeBindGroup;
    type Pipeline = FakePipeline;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> FakeBuffer {
        let id = self.next_id();
        self.push(DeviceEvent::CreateBuffer {
            id,
            label: desc.label.to_string(),
            usage: desc.usage,
            size: desc.contents.size(),
        });
        FakeBuffer(id)
    }

    fn write_buffer(&self, buffer: &FakeBuffer, offset: u64, data: &[u8]) {
        self.push(DeviceEvent::WriteBuffer { id: buffer.0, offset, data: data.to_vec() });
    }

    fn destroy_buffer(&self, buffer: &FakeBuffer) {
        self.push(DeviceEvent::DestroyBuffer { id: buffer.0 });
    }

    fn create_pipeline(&self, desc: &PipelineDesc<'_>) -> PipelineRecord<Self> {
        let id = self.next_id();
        self.push(DeviceEvent::CreatePipeline {
            id,
            shader: desc.shader,
            topology: desc.topology,
        });
        PipelineRecord {
            pipeline: FakePipeline(id),
            bind_group_layout: FakeLayout(id),
        }
    }

    fn create_uniform_bind_group(&self, _layout: &FakeLayout, buffer: &FakeBuffer, _label: &str) -> FakeBindGroup {
        let id = self.next_id();
        self.push(DeviceEvent::CreateBindGroup { id, buffer: buffer.0 });
        FakeBindGroup(id)
    }

    fn destroy(&self) {
        self.push(DeviceEvent::DestroyDevice);
    }
}

// ── pass ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PassCommand {
    SetPipeline { pipeline: FakePipeline },
    SetBindGroup { index: u32, group: FakeBindGroup },
    SetVertexBuffer { slot: u32, buffer: FakeBuffer },
    SetIndexBuffer { buffer: FakeBuffer, format: wgpu::IndexFormat },
    Draw { vertices: Range<u32>, instances: Range<u32> },
    DrawIndexed { indices: Range<u32>, base_vertex: i32, instances: Range<u32> },
}

impl PassCommand {
    pub fn is_draw(&self) -> bool {
        matches!(self, PassCommand::Draw { .. } | PassCommand::DrawIndexed { .. })
    }
}

#[derive(Debug, Default)]
pub struct FakePass {
    pub commands: Vec<PassCommand>,
}

impl DrawPass<FakeDevice> for FakePass {
    fn set_pipeline(&mut self, pipeline: &FakePipeline) {
        self.commands.push(PassCommand::SetPipeline { pipeline: *pipeline });
    }

    fn set_bind_group(&mut self, index: u32, group: &FakeBindGroup) {
        self.commands.push(PassCommand::SetBindGroup { index, group: *group });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &FakeBuffer) {
        self.commands.push(PassCommand::SetVertexBuffer { slot, buffer: *buffer });
    }

    fn set_index_buffer(&mut self, buffer: &FakeBuffer, format: wgpu::IndexFormat) {
        self.commands.push(PassCommand::SetIndexBuffer { buffer: *buffer, format });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.commands.push(PassCommand::Draw { vertices, instances });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.commands.push(PassCommand::DrawIndexed { indices, base_vertex, instances });
    }
}

// ── surface ───────────────────────────────────────────────────────────────

/// Shared view of what a [`FakeSurface`] did.
#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub resizes: Vec<(u32, u32)>,
    /// Commands recorded per presented frame.
    pub frames: Vec<Vec<PassCommand>>,
    /// Consumed front first; an empty queue acquires successfully.
    pub acquire_failures: VecDeque<AcquireError>,
    pub dropped: bool,
}

pub struct FakeSurface {
    size: (u32, u32),
    log: Rc<RefCell<SurfaceLog>>,
}

impl PresentSurface for FakeSurface {
    type Device = FakeDevice;

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn color_format(&self) -> wgpu::TextureFormat {
        wgpu::TextureFormat::Bgra8UnormSrgb
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.log.borrow_mut().resizes.push((width, height));
    }

    fn present_frame(
        &mut self,
        _clear: wgpu::Color,
        record: &mut dyn FnMut(&mut dyn DrawPass<FakeDevice>),
    ) -> Result<(), AcquireError> {
        if let Some(err) = self.log.borrow_mut().acquire_failures.pop_front() {
            return Err(err);
        }
        let mut pass = FakePass::default();
        record(&mut pass);
        self.log.borrow_mut().frames.push(pass.commands);
        Ok(())
    }
}

impl Drop for FakeSurface {
    fn drop(&mut self) {
        self.log.borrow_mut().dropped = true;
    }
}

// ── platform ──────────────────────────────────────────────────────────────

pub struct FakePlatform {
    pub device: FakeDevice,
    pub surface: Rc<RefCell<SurfaceLog>>,
    pub size: (u32, u32),
    negotiations: Cell<u32>,
    failure: RefCell<Option<RendererInitError>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            device: FakeDevice::new(),
            surface: Rc::default(),
            size: (800, 600),
            negotiations: Cell::new(0),
            failure: RefCell::new(None),
        }
    }

    /// Makes the next negotiation fail with `err`.
    pub fn fail_next(&self, err: RendererInitError) {
        *self.failure.borrow_mut() = Some(err);
    }

    pub fn negotiations(&self) -> u32 {
        self.negotiations.get()
    }
}

impl GpuPlatform for FakePlatform {
    type Device = FakeDevice;
    type Surface = FakeSurface;

    async fn negotiate(
        &self,
        _config: &RendererConfig,
    ) -> Result<Negotiated<FakeDevice, FakeSurface>, RendererInitError> {
        self.negotiations.set(self.negotiations.get() + 1);
        YieldOnce::default().await;

        if let Some(err) = self.failure.borrow_mut().take() {
            return Err(err);
        }

        Ok(Negotiated {
            device: self.device.clone(),
            surface: FakeSurface { size: self.size, log: Rc::clone(&self.surface) },
            adapter: AdapterSummary {
                name: "fake adapter".into(),
                backend: BackendKind::Vulkan,
                device_type: "Cpu".into(),
                max_texture_dimension_2d: 8192,
                max_bind_groups: 4,
            },
        })
    }
}

/// Returns `Pending` once, so concurrent callers get to interleave.
#[derive(Default)]
struct YieldOnce {
    yielded: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

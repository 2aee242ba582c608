use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::render::{DEPTH_FORMAT, NODE_UNIFORM_SIZE};

use super::surface::{choose_surface_format, WgpuSurface};
use super::{
    candidate_backends, AdapterSummary, BackendKind, BufferContents, BufferDesc, BufferUsage,
    GpuDevice, GpuPlatform, Negotiated, PipelineDesc, PipelineRecord, RendererConfig,
    RendererInitError, ShaderLibrary,
};

/// Features every backend must provide. Kept empty for portability.
const REQUIRED_FEATURES: wgpu::Features = wgpu::Features::empty();

/// Logical device, queue and compiled shaders.
///
/// Cheap to clone; all wgpu handles are reference counted.
#[derive(Debug, Clone)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    shaders: ShaderLibrary,
    /// Effective MSAA count; every pipeline and attachment uses it.
    sample_count: u32,
}

impl WgpuDevice {
    #[inline]
    pub fn raw(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[inline]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

impl GpuDevice for WgpuDevice {
    type Buffer = wgpu::Buffer;
    type BindGroupLayout = wgpu::BindGroupLayout;
    type BindGroup = wgpu::BindGroup;
    type Pipeline = wgpu::RenderPipeline;

    fn create_buffer(&self, desc: &BufferDesc<'_>) -> wgpu::Buffer {
        let usage = match desc.usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
        } | wgpu::BufferUsages::COPY_DST;

        match desc.contents {
            BufferContents::Init(bytes) => {
                self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(desc.label),
                    contents: bytes,
                    usage,
                })
            }
            BufferContents::Zeroed(size) => self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(desc.label),
                size,
                usage,
                mapped_at_creation: false,
            }),
        }
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer, offset, data);
    }

    fn destroy_buffer(&self, buffer: &wgpu::Buffer) {
        buffer.destroy();
    }

    fn create_pipeline(&self, desc: &PipelineDesc<'_>) -> PipelineRecord<Self> {
        let shader = self.shaders.module(desc.shader);

        let bind_group_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("lumen node bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(NODE_UNIFORM_SIZE),
                    },
                    count: None,
                }],
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        // Culling only means something for triangles.
        let cull_mode = match desc.topology {
            wgpu::PrimitiveTopology::TriangleList | wgpu::PrimitiveTopology::TriangleStrip => {
                desc.render_state.cull_face()
            }
            _ => None,
        };

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[desc.vertex_layout.to_wgpu()],
                },

                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: desc.color_format,
                        blend: desc.render_state.blend_state(),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: desc.topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(desc.render_state.depth_stencil()),
                multisample: wgpu::MultisampleState {
                    count: self.sample_count,
                    ..Default::default()
                },

                multiview_mask: None,
                cache: None,
            });

        PipelineRecord { pipeline, bind_group_layout }
    }

    fn create_uniform_bind_group(
        &self,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
        label: &str,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn destroy(&self) {
        self.device.destroy();
    }
}

/// Why a single backend candidate could not be used.
#[derive(Debug, Clone)]
enum CandidateError {
    Surface,
    Adapter(String),
}

/// Instance, surface and adapter that agreed on one backend.
struct Candidate {
    surface: wgpu::Surface<'static>,
    adapter: wgpu::Adapter,
}

/// Negotiates a wgpu device and surface for a winit window.
pub struct WgpuPlatform {
    window: Arc<Window>,
}

impl WgpuPlatform {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    async fn try_backend(
        &self,
        backend: BackendKind,
        config: &RendererConfig,
    ) -> Result<Candidate, CandidateError> {
        let flags = if config.validation {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::empty()
        };

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: backend.wgpu_backends(),
            flags: flags.with_env(),
            ..Default::default()
        });

        let surface = instance.create_surface(Arc::clone(&self.window)).map_err(|err| {
            log::debug!("{backend}: surface creation failed: {err}");
            CandidateError::Surface
        })?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference.to_wgpu(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| CandidateError::Adapter(err.to_string()))?;

        Ok(Candidate { surface, adapter })
    }

    async fn open(
        &self,
        backend: BackendKind,
        candidate: Candidate,
        config: &RendererConfig,
    ) -> Result<Negotiated<WgpuDevice, WgpuSurface>, RendererInitError> {
        let Candidate { surface, adapter } = candidate;
        let info = adapter.get_info();
        log::info!(
            "adapter: {} ({:?}, {:?}, driver {})",
            info.name,
            info.backend,
            info.device_type,
            info.driver
        );

        let base_limits = if backend.is_fallback() {
            wgpu::Limits::downlevel_webgl2_defaults()
        } else {
            wgpu::Limits::default()
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen device"),
                required_features: REQUIRED_FEATURES,
                required_limits: base_limits.using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| RendererInitError::DeviceCreationFailed {
                backend,
                adapter: info.name.clone(),
                reason: err.to_string(),
            })?;

        let caps = surface.get_capabilities(&adapter);
        let Some(format) = choose_surface_format(&caps, config.prefer_srgb) else {
            device.destroy();
            return Err(RendererInitError::SurfaceCreationFailed {
                backend,
                surface_kind: "window (no compatible formats)".into(),
            });
        };

        let shaders = match ShaderLibrary::compile(&device).await {
            Ok(shaders) => shaders,
            Err(err) => {
                device.destroy();
                return Err(err);
            }
        };

        let sample_count = supported_sample_count(&adapter, format, config.sample_count.get());
        let adapter_summary = AdapterSummary {
            name: info.name.clone(),
            backend: BackendKind::from_wgpu(info.backend),
            device_type: format!("{:?}", info.device_type),
            max_texture_dimension_2d: device.limits().max_texture_dimension_2d,
            max_bind_groups: device.limits().max_bind_groups,
        };

        let device = WgpuDevice { device, queue, shaders, sample_count };
        let size = self.window.inner_size();
        let surface = WgpuSurface::configure(
            surface,
            &adapter,
            device.clone(),
            format,
            (size.width, size.height),
            config,
        );

        Ok(Negotiated { device, surface, adapter: adapter_summary })
    }
}

impl GpuPlatform for WgpuPlatform {
    type Device = WgpuDevice;
    type Surface = WgpuSurface;

    async fn negotiate(
        &self,
        config: &RendererConfig,
    ) -> Result<Negotiated<WgpuDevice, WgpuSurface>, RendererInitError> {
        let mut selection = BackendSelection::new(config.preferred_backend);
        for backend in candidate_backends(config.preferred_backend) {
            log::debug!("trying {backend} backend");
            match self.try_backend(backend, config).await {
                Ok(candidate) => {
                    match selection.accept(backend) {
                        Some(FallbackNotice::Requested) => {
                            log::warn!("fallback backend requested explicitly; limits and features are reduced");
                        }
                        Some(FallbackNotice::Automatic) => {
                            log::warn!("no primary backend available; falling back to {backend}");
                        }
                        None => {}
                    }
                    log::info!("selected {backend} backend");
                    return self.open(backend, candidate, config).await;
                }
                Err(err) => selection.reject(backend, err)?,
            }
        }

        Err(selection.exhausted(std::env::consts::OS))
    }
}

/// How the fallback backend ended up selected.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum FallbackNotice {
    Requested,
    Automatic,
}

/// Candidate bookkeeping for one negotiation.
///
/// An explicit preference turns the first failure into the returned error;
/// automatic selection skips to the next candidate and reports adapter
/// failures once every candidate is exhausted.
#[derive(Debug)]
struct BackendSelection {
    explicit: bool,
    detected: Vec<BackendKind>,
}

impl BackendSelection {
    fn new(preferred: Option<BackendKind>) -> Self {
        Self { explicit: preferred.is_some(), detected: Vec::new() }
    }

    fn accept(&self, backend: BackendKind) -> Option<FallbackNotice> {
        match (backend.is_fallback(), self.explicit) {
            (false, _) => None,
            (true, true) => Some(FallbackNotice::Requested),
            (true, false) => Some(FallbackNotice::Automatic),
        }
    }

    /// `Err` ends the negotiation; `Ok` moves on to the next candidate.
    fn reject(&mut self, backend: BackendKind, err: CandidateError) -> Result<(), RendererInitError> {
        match err {
            CandidateError::Surface if self.explicit => Err(RendererInitError::SurfaceCreationFailed {
                backend,
                surface_kind: "window".into(),
            }),
            CandidateError::Adapter(reason) if self.explicit => {
                Err(RendererInitError::AdapterRequestFailed { backend, reason })
            }
            CandidateError::Surface => {
                log::info!("{backend} backend unavailable: no surface");
                Ok(())
            }
            CandidateError::Adapter(reason) => {
                log::info!("{backend} backend unavailable: {reason}");
                self.detected.push(backend);
                Ok(())
            }
        }
    }

    fn exhausted(self, platform: &str) -> RendererInitError {
        RendererInitError::NoGraphicsSupport {
            platform: platform.to_string(),
            detected_backends: self.detected,
            required_features: required_feature_names(REQUIRED_FEATURES),
        }
    }
}

/// Highest usable count not above `requested`: the requested one if both
/// the color and depth formats support it, 1 otherwise.
fn supported_sample_count(adapter: &wgpu::Adapter, format: wgpu::TextureFormat, requested: u32) -> u32 {
    if requested <= 1 {
        return 1;
    }
    let color = adapter.get_texture_format_features(format).flags;
    let depth = adapter.get_texture_format_features(DEPTH_FORMAT).flags;
    if color.sample_count_supported(requested) && depth.sample_count_supported(requested) {
        requested
    } else {
        log::warn!("{requested}x MSAA unsupported for {format:?}; rendering without multisampling");
        1
    }
}

fn required_feature_names(features: wgpu::Features) -> Vec<String> {
    if features.is_empty() {
        Vec::new()
    } else {
        vec![format!("{features:?}")]
    }
}

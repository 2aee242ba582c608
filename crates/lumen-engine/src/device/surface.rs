use crate::render::DEPTH_FORMAT;

use super::frame::GpuFrame;
use super::{AcquireError, DrawPass, PresentSurface, RendererConfig, WgpuDevice};

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if prefer_srgb {
        if let Some(f) = caps.formats.iter().copied().find(|f| f.is_srgb()) {
            return Some(f);
        }
    }
    caps.formats.first().copied()
}

pub(crate) fn choose_alpha_mode(caps: &wgpu::SurfaceCapabilities) -> wgpu::CompositeAlphaMode {
    caps.alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Surface extents may never be zero.
#[inline]
pub(crate) fn clamp_extent(width: u32, height: u32) -> (u32, u32) {
    (width.max(1), height.max(1))
}

/// Attachments that follow the swapchain size.
struct Targets {
    depth: wgpu::TextureView,
    /// Present only when multisampling.
    msaa: Option<wgpu::TextureView>,
}

impl Targets {
    fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, sample_count: u32) -> Self {
        let size = wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        };

        let depth = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("lumen depth target"),
                size,
                mip_level_count: 1,
                sample_count,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());

        let msaa = (sample_count > 1).then(|| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("lumen msaa color target"),
                    size,
                    mip_level_count: 1,
                    sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format: config.format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        Self { depth, msaa }
    }
}

/// Configured swapchain plus its depth/MSAA attachments.
pub struct WgpuSurface {
    surface: wgpu::Surface<'static>,
    device: WgpuDevice,
    config: wgpu::SurfaceConfiguration,
    targets: Targets,
}

impl WgpuSurface {
    /// Configures `surface` with `format` at `size` (clamped to 1x1).
    pub(crate) fn configure(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: WgpuDevice,
        format: wgpu::TextureFormat,
        size: (u32, u32),
        cfg: &RendererConfig,
    ) -> Self {
        let caps = surface.get_capabilities(adapter);
        let (width, height) = clamp_extent(size.0, size.1);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: cfg.present_mode(),
            alpha_mode: choose_alpha_mode(&caps),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(device.raw(), &config);
        let targets = Targets::new(device.raw(), &config, device.sample_count());

        log::info!(
            "surface configured: {:?} {}x{} ({:?}, {}x MSAA)",
            format,
            width,
            height,
            config.present_mode,
            device.sample_count()
        );

        Self { surface, device, config, targets }
    }

    fn acquire(&self) -> Result<GpuFrame, AcquireError> {
        let image = self.surface.get_current_texture()?;
        Ok(GpuFrame::new(image, self.device.raw()))
    }
}

impl PresentSurface for WgpuSurface {
    type Device = WgpuDevice;

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn color_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = clamp_extent(width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(self.device.raw(), &self.config);
        self.targets = Targets::new(self.device.raw(), &self.config, self.device.sample_count());
    }

    fn present_frame(
        &mut self,
        clear: wgpu::Color,
        record: &mut dyn FnMut(&mut dyn DrawPass<WgpuDevice>),
    ) -> Result<(), AcquireError> {
        let mut frame = self.acquire()?;

        {
            let mut pass = frame.begin_pass(clear, self.targets.msaa.as_ref(), &self.targets.depth);
            record(&mut pass);
        }

        frame.submit(self.device.queue());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: Vec<wgpu::TextureFormat>) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            present_modes: vec![wgpu::PresentMode::Fifo],
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque, wgpu::CompositeAlphaMode::PreMultiplied],
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    #[test]
    fn prefers_srgb_when_asked() {
        let c = caps(vec![wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Bgra8UnormSrgb]);
        assert_eq!(choose_surface_format(&c, true), Some(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert_eq!(choose_surface_format(&c, false), Some(wgpu::TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn falls_back_to_first_format() {
        let c = caps(vec![wgpu::TextureFormat::Rgba16Float]);
        assert_eq!(choose_surface_format(&c, true), Some(wgpu::TextureFormat::Rgba16Float));
        assert_eq!(choose_surface_format(&caps(vec![]), true), None);
    }

    #[test]
    fn alpha_mode_is_first_supported() {
        assert_eq!(choose_alpha_mode(&caps(vec![])), wgpu::CompositeAlphaMode::Opaque);
        let mut c = caps(vec![]);
        c.alpha_modes.clear();
        assert_eq!(choose_alpha_mode(&c), wgpu::CompositeAlphaMode::Auto);
    }

    #[test]
    fn zero_extent_clamps_to_one() {
        assert_eq!(clamp_extent(0, 0), (1, 1));
        assert_eq!(clamp_extent(640, 0), (640, 1));
        assert_eq!(clamp_extent(640, 480), (640, 480));
    }
}

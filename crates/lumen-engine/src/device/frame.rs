use std::ops::Range;

use super::{DrawPass, WgpuDevice};

/// Swapchain image acquired for one `render` call, with the encoder that
/// records into it.
///
/// Nothing reaches the screen until [`GpuFrame::submit`]. Dropping the frame
/// instead discards the recorded commands and releases the image unpresented.
pub struct GpuFrame {
    image: wgpu::SurfaceTexture,
    image_view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    pub(crate) fn new(image: wgpu::SurfaceTexture, device: &wgpu::Device) -> Self {
        let image_view = image.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lumen frame encoder"),
        });
        Self { image, image_view, encoder }
    }

    /// Opens the single pass of this frame, clearing color to `clear` and
    /// depth to 1.0. With `msaa` set, drawing goes there and resolves into
    /// the swapchain image.
    pub fn begin_pass<'f>(
        &'f mut self,
        clear: wgpu::Color,
        msaa: Option<&'f wgpu::TextureView>,
        depth: &'f wgpu::TextureView,
    ) -> wgpu::RenderPass<'f> {
        let (view, resolve_target) = color_attachment(&self.image_view, msaa);
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    /// Finishes the encoder and submits it, then presents the image. The
    /// submission is queued before presentation so the image shows this
    /// frame's commands.
    pub fn submit(self, queue: &wgpu::Queue) {
        let GpuFrame { image, image_view, encoder } = self;
        queue.submit(std::iter::once(encoder.finish()));
        drop(image_view);
        image.present();
    }
}

/// Render target and resolve target for the color attachment.
fn color_attachment<'a, V>(image: &'a V, msaa: Option<&'a V>) -> (&'a V, Option<&'a V>) {
    match msaa {
        Some(msaa) => (msaa, Some(image)),
        None => (image, None),
    }
}

impl DrawPass<WgpuDevice> for wgpu::RenderPass<'_> {
    fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline) {
        wgpu::RenderPass::set_pipeline(self, pipeline);
    }

    fn set_bind_group(&mut self, index: u32, group: &wgpu::BindGroup) {
        wgpu::RenderPass::set_bind_group(self, index, group, &[]);
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &wgpu::Buffer) {
        wgpu::RenderPass::set_vertex_buffer(self, slot, buffer.slice(..));
    }

    fn set_index_buffer(&mut self, buffer: &wgpu::Buffer, format: wgpu::IndexFormat) {
        wgpu::RenderPass::set_index_buffer(self, buffer.slice(..), format);
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        wgpu::RenderPass::draw(self, vertices, instances);
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        wgpu::RenderPass::draw_indexed(self, indices, base_vertex, instances);
    }
}

use std::collections::HashMap;
use std::rc::Rc;

use glam::Mat4;

use crate::device::{BufferContents, BufferDesc, BufferUsage, DrawPass, GpuDevice};
use crate::scene::{GeometryId, MeshGeometry, MeshNode, NodeId, PointCloud, PointsNode};

use super::cache::{GeometryCache, GeometryRecord, IndexRecord, PipelineCache, PipelineKey};
use super::{to_binding_blueprint, BindingBlueprint, GeometryKind, NodeResourceBundle, ResourceRegistry};

/// Size of a node's uniform buffer: one column-major 4x4 `f32` matrix.
pub const NODE_UNIFORM_SIZE: u64 = 64;

const _: () = assert!(NODE_UNIFORM_SIZE as usize >= std::mem::size_of::<[f32; 16]>());

/// Cache sizes and the draw count of the last `record`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub pipelines: usize,
    pub geometries: usize,
    pub bundles: usize,
    pub draw_calls: usize,
}

/// Turns drawable nodes into cached GPU resources and draw commands.
///
/// Render-thread only: the caches are plain maps with no synchronization.
/// Every buffer it allocates is registered for LIFO destruction in
/// [`dispose`](Self::dispose).
pub struct FrameRenderer<D: GpuDevice> {
    device: D,
    color_format: wgpu::TextureFormat,

    pipelines: PipelineCache<D>,
    geometries: GeometryCache<D>,
    bundles: HashMap<NodeId, NodeResourceBundle<D>>,

    registry: ResourceRegistry,
    draw_calls: usize,
    phase: Phase,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Phase {
    Live,
    Disposed,
}

impl<D: GpuDevice> FrameRenderer<D> {
    pub fn new(device: D, color_format: wgpu::TextureFormat) -> Self {
        Self {
            device,
            color_format,
            pipelines: PipelineCache::new(),
            geometries: GeometryCache::new(),
            bundles: HashMap::new(),
            registry: ResourceRegistry::new(),
            draw_calls: 0,
            phase: Phase::Live,
        }
    }

    #[inline]
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.phase == Phase::Disposed
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            pipelines: self.pipelines.len(),
            geometries: self.geometries.len(),
            bundles: self.bundles.len(),
            draw_calls: self.draw_calls,
        }
    }

    pub fn bundle(&self, id: NodeId) -> Option<&NodeResourceBundle<D>> {
        self.bundles.get(&id)
    }

    /// Creates resources for nodes seen for the first time. Nodes that
    /// already have a bundle are skipped, so repeated calls allocate nothing.
    ///
    /// # Panics
    /// After [`dispose`](Self::dispose), or when a node's material cannot
    /// draw its kind of geometry.
    pub fn prepare(&mut self, meshes: &[MeshNode], points: &[PointsNode]) {
        assert_eq!(self.phase, Phase::Live, "FrameRenderer::prepare called after dispose");

        for node in meshes {
            if self.bundles.contains_key(&node.id) {
                continue;
            }
            let blueprint = to_binding_blueprint(&node.material);
            assert_eq!(
                blueprint.geometry_kind,
                GeometryKind::Mesh,
                "{}: material {:?} cannot draw a mesh",
                node.id,
                node.material
            );
            let geometry = self.mesh_geometry(&node.geometry);
            self.create_bundle(node.id, &blueprint, node.geometry.id, geometry, None);
        }

        for node in points {
            if self.bundles.contains_key(&node.id) {
                continue;
            }
            let blueprint = to_binding_blueprint(&node.material);
            assert_eq!(
                blueprint.geometry_kind,
                GeometryKind::PointCloud,
                "{}: material {:?} cannot draw a point cloud",
                node.id,
                node.material
            );
            let floats = blueprint.vertex_layout.floats_per_element();
            assert!(
                node.cloud.data().len() % floats == 0,
                "{}: instance data has {} floats, layout expects multiples of {floats}",
                node.id,
                node.cloud.data().len()
            );
            let geometry = self.point_geometry(&node.cloud);
            let instances = node.cloud.instance_count();
            self.create_bundle(node.id, &blueprint, node.cloud.id, geometry, Some(instances));
        }
    }

    /// Writes each node's MVP and records its draw, in the order given.
    ///
    /// # Panics
    /// After [`dispose`](Self::dispose), or for a node that was never prepared.
    pub fn record(
        &mut self,
        pass: &mut dyn DrawPass<D>,
        meshes: &[MeshNode],
        points: &[PointsNode],
        view_projection: Mat4,
    ) {
        assert_eq!(self.phase, Phase::Live, "FrameRenderer::record called after dispose");

        self.draw_calls = 0;
        for node in meshes {
            self.record_node(pass, node.id, node.world, view_projection);
        }
        for node in points {
            self.record_node(pass, node.id, node.world, view_projection);
        }
    }

    /// Destroys every buffer this renderer created and empties all caches.
    /// Later calls are no-ops.
    pub fn dispose(&mut self) {
        if std::mem::replace(&mut self.phase, Phase::Disposed) == Phase::Disposed {
            return;
        }
        log::debug!(
            "disposing frame renderer: {} bundles, {} geometries, {} pipelines",
            self.bundles.len(),
            self.geometries.len(),
            self.pipelines.len()
        );

        self.registry.dispose_all();
        self.bundles.clear();
        self.geometries.clear();
        self.pipelines.clear();
        self.draw_calls = 0;
    }

    fn record_node(&mut self, pass: &mut dyn DrawPass<D>, id: NodeId, world: Mat4, view_projection: Mat4) {
        let Some(bundle) = self.bundles.get(&id) else {
            panic!("{id} recorded before prepare");
        };

        let mvp = view_projection * world;
        self.device
            .write_buffer(&bundle.uniform_buffer, 0, bytemuck::cast_slice(&mvp.to_cols_array()));

        let geometry = &bundle.geometry;
        if geometry.vertex_count == 0 || bundle.instance_count == Some(0) {
            log::trace!("{id}: empty geometry, nothing to draw");
            return;
        }

        pass.set_pipeline(&bundle.pipeline.pipeline);
        pass.set_bind_group(0, &bundle.bind_group);
        pass.set_vertex_buffer(0, &geometry.vertex_buffer);

        match (bundle.instance_count, &geometry.index) {
            (Some(instances), _) => pass.draw(0..1, 0..instances),
            (None, Some(index)) => {
                pass.set_index_buffer(&index.buffer, index.format);
                pass.draw_indexed(0..index.count, 0, 0..1);
            }
            (None, None) => pass.draw(0..geometry.vertex_count, 0..1),
        }
        self.draw_calls += 1;
    }

    fn create_bundle(
        &mut self,
        id: NodeId,
        blueprint: &BindingBlueprint,
        geometry_id: GeometryId,
        geometry: Rc<GeometryRecord<D>>,
        instance_count: Option<u32>,
    ) {
        let Self { device, color_format, pipelines, bundles, registry, .. } = self;

        let pipeline_key = PipelineKey::new(blueprint, *color_format);
        let pipeline = Rc::clone(pipelines.get_or_create(pipeline_key, || {
            log::debug!("creating pipeline {:?} for {:?}", blueprint.kind, color_format);
            Rc::new(blueprint.create_pipeline(device, *color_format))
        }));

        let label = format!("lumen {id} uniforms");
        let uniform_buffer = create_tracked_buffer(
            device,
            registry,
            &BufferDesc {
                label: &label,
                usage: BufferUsage::Uniform,
                contents: BufferContents::Zeroed(NODE_UNIFORM_SIZE),
            },
        );
        let bind_group =
            device.create_uniform_bind_group(&pipeline.bind_group_layout, &uniform_buffer, &label);

        bundles.insert(
            id,
            NodeResourceBundle {
                pipeline_key,
                geometry_id,
                pipeline,
                geometry,
                uniform_buffer,
                bind_group,
                instance_count,
            },
        );
    }

    fn mesh_geometry(&mut self, geometry: &MeshGeometry) -> Rc<GeometryRecord<D>> {
        let Self { device, geometries, registry, .. } = self;
        Rc::clone(geometries.get_or_create(geometry.id, || {
            let label = format!("lumen {} vertices", geometry.id);
            let vertex_buffer = create_tracked_buffer(
                device,
                registry,
                &BufferDesc {
                    label: &label,
                    usage: BufferUsage::Vertex,
                    contents: BufferContents::Init(bytemuck::cast_slice(&geometry.vertices)),
                },
            );

            let index = geometry.draw_indices().map(|indices| {
                let label = format!("lumen {} indices", geometry.id);
                IndexRecord {
                    buffer: create_tracked_buffer(
                        device,
                        registry,
                        &BufferDesc {
                            label: &label,
                            usage: BufferUsage::Index,
                            contents: BufferContents::Init(indices.as_bytes()),
                        },
                    ),
                    count: indices.len() as u32,
                    format: indices.format(),
                }
            });

            Rc::new(GeometryRecord {
                vertex_buffer,
                vertex_count: geometry.vertex_count(),
                index,
            })
        }))
    }

    fn point_geometry(&mut self, cloud: &PointCloud) -> Rc<GeometryRecord<D>> {
        let Self { device, geometries, registry, .. } = self;
        Rc::clone(geometries.get_or_create(cloud.id, || {
            let label = format!("lumen {} instances", cloud.id);
            let vertex_buffer = create_tracked_buffer(
                device,
                registry,
                &BufferDesc {
                    label: &label,
                    usage: BufferUsage::Vertex,
                    contents: BufferContents::Init(bytemuck::cast_slice(cloud.data())),
                },
            );
            Rc::new(GeometryRecord {
                vertex_buffer,
                vertex_count: cloud.instance_count(),
                index: None,
            })
        }))
    }
}

impl<D: GpuDevice> Drop for FrameRenderer<D> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn create_tracked_buffer<D: GpuDevice>(
    device: &D,
    registry: &mut ResourceRegistry,
    desc: &BufferDesc<'_>,
) -> D::Buffer {
    let buffer = device.create_buffer(desc);
    let (device, handle) = (device.clone(), buffer.clone());
    registry.register(move || {
        device.destroy_buffer(&handle);
        Ok(())
    });
    buffer
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use super::*;
    use crate::device::ShaderId;
    use crate::render::{Material, RenderState};
    use crate::scene::{Indices, MeshVertex, PointInstance};
    use crate::testing::{DeviceEvent, FakeDevice, FakePass, PassCommand};

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    fn triangle() -> Arc<MeshGeometry> {
        Arc::new(MeshGeometry::new(vec![MeshVertex::default(); 3]))
    }

    fn cloud(n: usize) -> Arc<PointCloud> {
        Arc::new(PointCloud::from_instances(&vec![PointInstance::default(); n]))
    }

    // ── prepare ───────────────────────────────────────────────────────────

    #[test]
    fn shared_geometry_and_material_share_records() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device.clone(), FORMAT);

        let geo = Arc::new(MeshGeometry::cube());
        let mat = Arc::new(Material::unlit());
        let a = MeshNode::new(geo.clone(), mat.clone());
        let b = MeshNode::new(geo, mat).with_world(Mat4::from_translation(Vec3::X));

        fr.prepare(&[a.clone(), b.clone()], &[]);

        let stats = fr.stats();
        assert_eq!((stats.geometries, stats.pipelines, stats.bundles), (1, 1, 2));
        assert_eq!(device.pipelines_created(), 1);
        // vertex + index + two uniforms
        assert_eq!(device.buffers_created(), 4);

        let (ba, bb) = (fr.bundle(a.id).unwrap(), fr.bundle(b.id).unwrap());
        assert_ne!(ba.uniform_buffer, bb.uniform_buffer);
        assert!(Rc::ptr_eq(&ba.geometry, &bb.geometry));
        assert_eq!(ba.pipeline_key, bb.pipeline_key);
    }

    #[test]
    fn prepare_is_idempotent() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device.clone(), FORMAT);
        let meshes = [MeshNode::new(triangle(), Arc::new(Material::unlit()))];
        let points = [PointsNode::new(cloud(4), Arc::new(Material::points()))];

        fr.prepare(&meshes, &points);
        let before = device.events().len();
        fr.prepare(&meshes, &points);

        assert_eq!(device.events().len(), before);
    }

    #[test]
    fn pipelines_dedupe_by_kind_and_state() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device.clone(), FORMAT);
        let geo = triangle();
        let meshes = [
            MeshNode::new(geo.clone(), Arc::new(Material::unlit())),
            MeshNode::new(geo.clone(), Arc::new(Material::unlit())),
            MeshNode::new(geo.clone(), Arc::new(Material::lines())),
            MeshNode::new(geo, Arc::new(Material::UnlitColor { state: RenderState::TRANSPARENT })),
        ];

        fr.prepare(&meshes, &[]);

        assert_eq!(fr.stats().pipelines, 3);
        assert_eq!(device.pipelines_created(), 3);
        assert_eq!(fr.stats().geometries, 1);
    }

    #[test]
    fn uniform_buffers_hold_a_matrix() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device.clone(), FORMAT);
        fr.prepare(&[MeshNode::new(triangle(), Arc::new(Material::unlit()))], &[]);

        let uniforms: Vec<u64> = device
            .events()
            .into_iter()
            .filter_map(|e| match e {
                DeviceEvent::CreateBuffer { usage: BufferUsage::Uniform, size, .. } => Some(size),
                _ => None,
            })
            .collect();
        assert_eq!(uniforms, vec![64]);
    }

    #[test]
    fn empty_index_list_uploads_no_index_buffer() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device.clone(), FORMAT);
        let geo = Arc::new(MeshGeometry::indexed(vec![MeshVertex::default(); 3], Indices::U16(vec![])));
        let node = MeshNode::new(geo, Arc::new(Material::unlit()));

        fr.prepare(std::slice::from_ref(&node), &[]);

        assert!(fr.bundle(node.id).unwrap().geometry.index.is_none());
    }

    #[test]
    fn points_bundle_carries_instance_count() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device.clone(), FORMAT);
        let node = PointsNode::new(cloud(5), Arc::new(Material::points()));

        fr.prepare(&[], std::slice::from_ref(&node));

        assert_eq!(fr.bundle(node.id).unwrap().instance_count, Some(5));
        assert!(device.events().iter().any(|e| matches!(
            e,
            DeviceEvent::CreatePipeline { shader: ShaderId::Points, .. }
        )));
    }

    #[test]
    #[should_panic(expected = "cannot draw a mesh")]
    fn point_material_on_mesh_fails_fast() {
        let mut fr = FrameRenderer::new(FakeDevice::new(), FORMAT);
        fr.prepare(&[MeshNode::new(triangle(), Arc::new(Material::points()))], &[]);
    }

    #[test]
    #[should_panic(expected = "cannot draw a point cloud")]
    fn mesh_material_on_points_fails_fast() {
        let mut fr = FrameRenderer::new(FakeDevice::new(), FORMAT);
        fr.prepare(&[], &[PointsNode::new(cloud(1), Arc::new(Material::unlit()))]);
    }

    // ── record ────────────────────────────────────────────────────────────

    #[test]
    fn mvp_is_view_projection_times_world() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device.clone(), FORMAT);
        let node = MeshNode::new(triangle(), Arc::new(Material::unlit()))
            .with_world(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        let nodes = [node];
        fr.prepare(&nodes, &[]);

        let mut pass = FakePass::default();
        fr.record(&mut pass, &nodes, &[], Mat4::IDENTITY);

        let uniform = fr.bundle(nodes[0].id).unwrap().uniform_buffer;
        let written = device.last_write(uniform).expect("uniform written");
        assert_eq!(written.len(), 16);
        assert_eq!(&written[12..16], &[1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn mvp_composes_right_to_left() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device.clone(), FORMAT);
        let world = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let view_projection = Mat4::from_scale(Vec3::splat(2.0));
        let nodes = [MeshNode::new(triangle(), Arc::new(Material::unlit())).with_world(world)];
        fr.prepare(&nodes, &[]);

        fr.record(&mut FakePass::default(), &nodes, &[], view_projection);

        let uniform = fr.bundle(nodes[0].id).unwrap().uniform_buffer;
        let written = device.last_write(uniform).unwrap();
        assert_eq!(written, (view_projection * world).to_cols_array().to_vec());
        assert_eq!(written[12], 2.0);
    }

    #[test]
    fn indexed_unindexed_and_points_draw_differently() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device, FORMAT);
        let cube = MeshNode::new(Arc::new(MeshGeometry::cube()), Arc::new(Material::unlit()));
        let tri = MeshNode::new(triangle(), Arc::new(Material::lines()));
        let pts = PointsNode::new(cloud(7), Arc::new(Material::points()));
        let (meshes, points) = ([cube, tri], [pts]);
        fr.prepare(&meshes, &points);

        let mut pass = FakePass::default();
        fr.record(&mut pass, &meshes, &points, Mat4::IDENTITY);

        let draws: Vec<PassCommand> = pass.commands.into_iter().filter(PassCommand::is_draw).collect();
        assert_eq!(
            draws,
            vec![
                PassCommand::DrawIndexed { indices: 0..36, base_vertex: 0, instances: 0..1 },
                PassCommand::Draw { vertices: 0..3, instances: 0..1 },
                PassCommand::Draw { vertices: 0..1, instances: 0..7 },
            ]
        );
        assert_eq!(fr.stats().draw_calls, 3);
    }

    #[test]
    fn record_binds_in_supplied_order() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device, FORMAT);
        let geo = triangle();
        let mat = Arc::new(Material::unlit());
        let nodes: Vec<MeshNode> = (0..3).map(|_| MeshNode::new(geo.clone(), mat.clone())).collect();
        fr.prepare(&nodes, &[]);

        let reversed: Vec<MeshNode> = nodes.iter().rev().cloned().collect();
        let mut pass = FakePass::default();
        fr.record(&mut pass, &reversed, &[], Mat4::IDENTITY);

        let groups: Vec<_> = pass
            .commands
            .iter()
            .filter_map(|c| match c {
                PassCommand::SetBindGroup { group, .. } => Some(*group),
                _ => None,
            })
            .collect();
        let expected: Vec<_> = reversed.iter().map(|n| fr.bundle(n.id).unwrap().bind_group).collect();
        assert_eq!(groups, expected);
    }

    #[test]
    fn indexed_draw_binds_index_format() {
        let mut fr = FrameRenderer::new(FakeDevice::new(), FORMAT);
        let geo = Arc::new(MeshGeometry::indexed(
            vec![MeshVertex::default(); 4],
            Indices::U32(vec![0, 1, 2, 0, 2, 3]),
        ));
        let nodes = [MeshNode::new(geo, Arc::new(Material::unlit()))];
        fr.prepare(&nodes, &[]);

        let mut pass = FakePass::default();
        fr.record(&mut pass, &nodes, &[], Mat4::IDENTITY);

        assert!(pass.commands.iter().any(|c| matches!(
            c,
            PassCommand::SetIndexBuffer { format: wgpu::IndexFormat::Uint32, .. }
        )));
    }

    #[test]
    #[should_panic(expected = "recorded before prepare")]
    fn record_without_prepare_panics() {
        let mut fr = FrameRenderer::new(FakeDevice::new(), FORMAT);
        let nodes = [MeshNode::new(triangle(), Arc::new(Material::unlit()))];
        fr.record(&mut FakePass::default(), &nodes, &[], Mat4::IDENTITY);
    }

    // ── dispose ───────────────────────────────────────────────────────────

    #[test]
    fn dispose_destroys_every_buffer_once() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device.clone(), FORMAT);
        let geo = Arc::new(MeshGeometry::cube());
        let mat = Arc::new(Material::unlit());
        fr.prepare(
            &[MeshNode::new(geo.clone(), mat.clone()), MeshNode::new(geo, mat)],
            &[PointsNode::new(cloud(3), Arc::new(Material::points()))],
        );
        let created = device.created_buffer_ids();

        fr.dispose();
        fr.dispose();

        let mut destroyed = device.destroyed_buffer_ids();
        // LIFO: last allocation goes first.
        assert_eq!(destroyed.first(), created.last());
        destroyed.sort_unstable();
        assert_eq!(destroyed, created);
        assert_eq!(fr.stats(), FrameStats::default());
        assert!(fr.is_disposed());
    }

    #[test]
    fn drop_disposes_live_renderer() {
        let device = FakeDevice::new();
        {
            let mut fr = FrameRenderer::new(device.clone(), FORMAT);
            fr.prepare(&[MeshNode::new(triangle(), Arc::new(Material::unlit()))], &[]);
        }
        assert_eq!(device.destroyed_buffer_ids().len(), device.buffers_created());
    }

    #[test]
    #[should_panic(expected = "after dispose")]
    fn prepare_after_dispose_panics() {
        let mut fr = FrameRenderer::new(FakeDevice::new(), FORMAT);
        fr.dispose();
        fr.prepare(&[], &[]);
    }

    #[test]
    #[should_panic(expected = "record called after dispose")]
    fn record_after_dispose_panics() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device, FORMAT);
        let node = MeshNode::new(triangle(), Arc::new(Material::unlit()));
        fr.prepare(std::slice::from_ref(&node), &[]);
        fr.dispose();

        let mut pass = FakePass::default();
        fr.record(&mut pass, &[node], &[], Mat4::IDENTITY);
    }

    #[test]
    fn dispose_leaves_live_phase_exactly_once() {
        let device = FakeDevice::new();
        let mut fr = FrameRenderer::new(device.clone(), FORMAT);
        assert!(!fr.is_disposed());
        fr.prepare(&[MeshNode::new(triangle(), Arc::new(Material::unlit()))], &[]);

        fr.dispose();
        assert!(fr.is_disposed());
        let destroyed = device.destroyed_buffer_ids().len();

        fr.dispose();
        drop(fr);
        assert_eq!(device.destroyed_buffer_ids().len(), destroyed);
    }
}

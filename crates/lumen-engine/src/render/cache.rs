use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use crate::device::{GpuDevice, PipelineRecord};
use crate::scene::GeometryId;

use super::{BindingBlueprint, BlueprintKind, RenderState};

/// Memoization table. The producer runs once per key, on a miss only.
///
/// Not synchronized: owned by the frame renderer on the render thread.
#[derive(Debug)]
pub struct MemoCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<K: Eq + Hash, V> MemoCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create<F>(&mut self, key: K, producer: F) -> &V
    where
        F: FnOnce() -> V,
    {
        self.entries.entry(key).or_insert_with(producer)
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Pipeline cache key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineKey {
    pub kind: BlueprintKind,
    pub render_state: RenderState,
    pub color_format: wgpu::TextureFormat,
}

impl PipelineKey {
    pub fn new(blueprint: &BindingBlueprint, color_format: wgpu::TextureFormat) -> Self {
        Self {
            kind: blueprint.kind,
            render_state: blueprint.render_state,
            color_format,
        }
    }
}

pub struct IndexRecord<D: GpuDevice> {
    pub buffer: D::Buffer,
    pub count: u32,
    pub format: wgpu::IndexFormat,
}

/// Uploaded buffers for one geometry identity.
pub struct GeometryRecord<D: GpuDevice> {
    pub vertex_buffer: D::Buffer,
    /// Vertices for meshes, instances for point clouds.
    pub vertex_count: u32,
    pub index: Option<IndexRecord<D>>,
}

/// Per-node GPU state. Created once per node id, never rebuilt.
pub struct NodeResourceBundle<D: GpuDevice> {
    pub pipeline_key: PipelineKey,
    pub geometry_id: GeometryId,
    pub pipeline: Rc<PipelineRecord<D>>,
    pub geometry: Rc<GeometryRecord<D>>,
    pub uniform_buffer: D::Buffer,
    pub bind_group: D::BindGroup,
    /// Set for instanced-point nodes.
    pub instance_count: Option<u32>,
}

pub type PipelineCache<D> = MemoCache<PipelineKey, Rc<PipelineRecord<D>>>;
pub type GeometryCache<D> = MemoCache<GeometryId, Rc<GeometryRecord<D>>>;

//! Material variants and the pipeline recipe each one maps to.

use crate::device::{GpuDevice, PipelineDesc, PipelineRecord, ShaderId};
use crate::scene::{MeshVertex, PointInstance, POINT_INSTANCE_FLOATS};

use super::RenderState;

// ── materials ─────────────────────────────────────────────────────────────

/// Closed set of materials the core can draw.
///
/// Colors come from the geometry (per vertex or per instance); a material
/// only picks the shader family, topology and fixed-function state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Material {
    /// Filled triangles, per-vertex color.
    UnlitColor { state: RenderState },
    /// Line list over mesh vertices, per-vertex color.
    Lines { state: RenderState },
    /// One point per 11-float instance record.
    InstancedPoints { state: RenderState },
}

impl Material {
    pub fn unlit() -> Self {
        Material::UnlitColor { state: RenderState::OPAQUE }
    }

    pub fn lines() -> Self {
        Material::Lines { state: RenderState::OPAQUE.with_cull(super::CullMode::None) }
    }

    pub fn points() -> Self {
        Material::InstancedPoints { state: RenderState::ADDITIVE }
    }

    pub fn render_state(&self) -> RenderState {
        match *self {
            Material::UnlitColor { state }
            | Material::Lines { state }
            | Material::InstancedPoints { state } => state,
        }
    }
}

// ── vertex layouts ────────────────────────────────────────────────────────

const MESH_ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x3, // position
    1 => Float32x3  // color
];

const POINT_ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3, // position
    1 => Float32x3, // color
    2 => Float32,   // size
    3 => Float32x4  // extra
];

/// Layout of the single vertex buffer a blueprint binds at slot 0.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    pub stride: u64,
    pub step_mode: wgpu::VertexStepMode,
    pub attributes: &'static [wgpu::VertexAttribute],
}

impl VertexLayout {
    pub const MESH: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<MeshVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_ATTRS,
    };

    pub const POINT_INSTANCE: VertexLayout = VertexLayout {
        stride: std::mem::size_of::<PointInstance>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &POINT_ATTRS,
    };

    /// Number of `f32` in one element.
    pub fn floats_per_element(&self) -> usize {
        self.stride as usize / std::mem::size_of::<f32>()
    }

    pub fn to_wgpu(&self) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: self.step_mode,
            attributes: self.attributes,
        }
    }
}

const _: () = assert!(std::mem::size_of::<PointInstance>() == POINT_INSTANCE_FLOATS * 4);
const _: () = assert!(std::mem::size_of::<MeshVertex>() == 24);

// ── blueprints ────────────────────────────────────────────────────────────

/// Pipeline family. Together with render state and color format it keys
/// the pipeline cache.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlueprintKind {
    UnlitColor,
    Lines,
    InstancedPoints,
}

impl BlueprintKind {
    pub fn shader(self) -> ShaderId {
        match self {
            BlueprintKind::UnlitColor | BlueprintKind::Lines => ShaderId::UnlitColor,
            BlueprintKind::InstancedPoints => ShaderId::Points,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BlueprintKind::UnlitColor => "lumen unlit color pipeline",
            BlueprintKind::Lines => "lumen lines pipeline",
            BlueprintKind::InstancedPoints => "lumen instanced points pipeline",
        }
    }
}

/// Which kind of drawable a blueprint can consume.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GeometryKind {
    Mesh,
    PointCloud,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingBlueprint {
    pub kind: BlueprintKind,
    pub vertex_layout: VertexLayout,
    pub topology: wgpu::PrimitiveTopology,
    pub render_state: RenderState,
    pub geometry_kind: GeometryKind,
}

impl BindingBlueprint {
    pub fn create_pipeline<D: GpuDevice>(
        &self,
        device: &D,
        color_format: wgpu::TextureFormat,
    ) -> PipelineRecord<D> {
        device.create_pipeline(&PipelineDesc {
            label: self.kind.label(),
            shader: self.kind.shader(),
            vertex_layout: &self.vertex_layout,
            topology: self.topology,
            render_state: self.render_state,
            color_format,
        })
    }
}

/// Maps a material to its blueprint. Total over [`Material`].
pub fn to_binding_blueprint(material: &Material) -> BindingBlueprint {
    match *material {
        Material::UnlitColor { state } => BindingBlueprint {
            kind: BlueprintKind::UnlitColor,
            vertex_layout: VertexLayout::MESH,
            topology: wgpu::PrimitiveTopology::TriangleList,
            render_state: state,
            geometry_kind: GeometryKind::Mesh,
        },
        Material::Lines { state } => BindingBlueprint {
            kind: BlueprintKind::Lines,
            vertex_layout: VertexLayout::MESH,
            topology: wgpu::PrimitiveTopology::LineList,
            render_state: state,
            geometry_kind: GeometryKind::Mesh,
        },
        Material::InstancedPoints { state } => BindingBlueprint {
            kind: BlueprintKind::InstancedPoints,
            vertex_layout: VertexLayout::POINT_INSTANCE,
            topology: wgpu::PrimitiveTopology::PointList,
            render_state: state,
            geometry_kind: GeometryKind::PointCloud,
        },
    }
}

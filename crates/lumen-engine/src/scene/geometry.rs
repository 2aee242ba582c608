use bytemuck::{Pod, Zeroable};

use super::GeometryId;

/// Floats per instanced-point record: position 3, color 3, size 1, extra 4.
pub const POINT_INSTANCE_FLOATS: usize = 11;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl MeshVertex {
    #[inline]
    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    pub fn len(&self) -> usize {
        match self {
            Indices::U16(v) => v.len(),
            Indices::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> wgpu::IndexFormat {
        match self {
            Indices::U16(_) => wgpu::IndexFormat::Uint16,
            Indices::U32(_) => wgpu::IndexFormat::Uint32,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Indices::U16(v) => bytemuck::cast_slice(v),
            Indices::U32(v) => bytemuck::cast_slice(v),
        }
    }

    fn max(&self) -> Option<u32> {
        match self {
            Indices::U16(v) => v.iter().copied().max().map(u32::from),
            Indices::U32(v) => v.iter().copied().max(),
        }
    }
}

/// Vertex (and optional index) data for a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    pub id: GeometryId,
    pub vertices: Vec<MeshVertex>,
    pub indices: Option<Indices>,
}

impl MeshGeometry {
    pub fn new(vertices: Vec<MeshVertex>) -> Self {
        Self { id: GeometryId::fresh(), vertices, indices: None }
    }

    /// # Panics
    /// If any index points past the vertex list.
    pub fn indexed(vertices: Vec<MeshVertex>, indices: Indices) -> Self {
        if let Some(max) = indices.max() {
            assert!(
                (max as usize) < vertices.len(),
                "index {max} out of range for {} vertices",
                vertices.len()
            );
        }
        Self { id: GeometryId::fresh(), vertices, indices: Some(indices) }
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Indices that should actually be bound; an empty list counts as none.
    pub fn draw_indices(&self) -> Option<&Indices> {
        self.indices.as_ref().filter(|i| !i.is_empty())
    }

    /// Axis-aligned unit cube centered on the origin, one color per face pair.
    pub fn cube() -> Self {
        let p = 0.5;
        let corners = [
            [-p, -p, -p],
            [p, -p, -p],
            [p, p, -p],
            [-p, p, -p],
            [-p, -p, p],
            [p, -p, p],
            [p, p, p],
            [-p, p, p],
        ];
        let vertices = corners
            .iter()
            .map(|&c| MeshVertex::new(c, [c[0] + 0.5, c[1] + 0.5, c[2] + 0.5]))
            .collect();
        #[rustfmt::skip]
        let indices = vec![
            4, 5, 6, 4, 6, 7, // +z
            1, 0, 3, 1, 3, 2, // -z
            5, 1, 2, 5, 2, 6, // +x
            0, 4, 7, 0, 7, 3, // -x
            7, 6, 2, 7, 2, 3, // +y
            0, 1, 5, 0, 5, 4, // -y
        ];
        Self::indexed(vertices, Indices::U16(indices))
    }
}

/// One instanced point, laid out exactly as the points pipeline reads it.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub size: f32,
    pub extra: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<PointInstance>() == POINT_INSTANCE_FLOATS * 4);

/// Flat instance data, [`POINT_INSTANCE_FLOATS`] per point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub id: GeometryId,
    data: Vec<f32>,
}

impl PointCloud {
    pub fn from_instances(instances: &[PointInstance]) -> Self {
        Self {
            id: GeometryId::fresh(),
            data: bytemuck::cast_slice(instances).to_vec(),
        }
    }

    /// # Panics
    /// If `data` is not a whole number of instance records.
    pub fn from_raw(data: Vec<f32>) -> Self {
        assert!(
            data.len() % POINT_INSTANCE_FLOATS == 0,
            "point data has {} floats, not a multiple of {POINT_INSTANCE_FLOATS}",
            data.len()
        );
        Self { id: GeometryId::fresh(), data }
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn instance_count(&self) -> u32 {
        (self.data.len() / POINT_INSTANCE_FLOATS) as u32
    }
}

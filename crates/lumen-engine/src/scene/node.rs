use std::sync::Arc;

use glam::Mat4;

use crate::render::Material;

use super::{MeshGeometry, NodeId, PointCloud};

/// Mesh drawable. `world` is resolved by the scene before collection.
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub id: NodeId,
    pub geometry: Arc<MeshGeometry>,
    pub material: Arc<Material>,
    pub world: Mat4,
}

impl MeshNode {
    pub fn new(geometry: Arc<MeshGeometry>, material: Arc<Material>) -> Self {
        Self { id: NodeId::fresh(), geometry, material, world: Mat4::IDENTITY }
    }

    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }
}

/// Instanced point-cloud drawable.
#[derive(Debug, Clone)]
pub struct PointsNode {
    pub id: NodeId,
    pub cloud: Arc<PointCloud>,
    pub material: Arc<Material>,
    pub world: Mat4,
}

impl PointsNode {
    pub fn new(cloud: Arc<PointCloud>, material: Arc<Material>) -> Self {
        Self { id: NodeId::fresh(), cloud, material, world: Mat4::IDENTITY }
    }

    pub fn with_world(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }
}

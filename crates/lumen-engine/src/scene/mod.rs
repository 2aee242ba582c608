//! Scene-side inputs of the renderer.
//!
//! Responsibilities:
//! - stable identities for nodes and geometries (cache keys)
//! - CPU geometry: mesh vertices/indices, instanced point records
//! - the flat, ordered draw list collected each frame
//! - the scene/camera contracts the lifecycle calls into

mod camera;
mod geometry;
mod ids;
mod list;
mod node;

pub use camera::{CameraSource, PerspectiveCamera};
pub use geometry::{Indices, MeshGeometry, MeshVertex, PointCloud, PointInstance, POINT_INSTANCE_FLOATS};
pub use ids::{GeometryId, NodeId};
pub use list::DrawList;
pub use node::{MeshNode, PointsNode};

/// Scene as seen by the renderer.
pub trait SceneSource {
    /// Resolves world transforms. Called once per frame before collection.
    fn update_world_matrices(&mut self) {}

    /// Appends this frame's drawables, in draw order.
    fn collect_drawables(&self, out: &mut DrawList);
}

/// Scene that already is a flat list of nodes with resolved transforms.
#[derive(Debug, Default, Clone)]
pub struct FlatScene {
    pub meshes: Vec<MeshNode>,
    pub points: Vec<PointsNode>,
}

impl FlatScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, node: MeshNode) -> NodeId {
        let id = node.id;
        self.meshes.push(node);
        id
    }

    pub fn add_points(&mut self, node: PointsNode) -> NodeId {
        let id = node.id;
        self.points.push(node);
        id
    }
}

impl SceneSource for FlatScene {
    fn collect_drawables(&self, out: &mut DrawList) {
        out.meshes.extend(self.meshes.iter().cloned());
        out.points.extend(self.points.iter().cloned());
    }
}

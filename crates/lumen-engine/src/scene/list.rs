use super::{MeshNode, PointsNode};

/// Drawables collected for one frame, in draw order.
///
/// No sorting happens here or downstream; the collector decides the order.
#[derive(Debug, Default, Clone)]
pub struct DrawList {
    pub meshes: Vec<MeshNode>,
    pub points: Vec<PointsNode>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears both lists. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.meshes.clear();
        self.points.clear();
    }

    #[inline]
    pub fn push_mesh(&mut self, node: MeshNode) {
        self.meshes.push(node);
    }

    #[inline]
    pub fn push_points(&mut self, node: PointsNode) {
        self.points.push(node);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.meshes.len() + self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

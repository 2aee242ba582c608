//! GPU rendering subsystem.
//!
//! Turns the frame's draw list into cached GPU resources and draw commands:
//! - `blueprint`: material variant -> vertex layout, topology, pipeline recipe
//! - `cache`: memo tables for pipelines and uploaded geometry
//! - `frame_renderer`: per-node bundles, MVP upload, draw recording
//! - `registry`: LIFO teardown of everything allocated
//!
//! Convention: glam column-major matrices, MVP = view_projection * world.

mod blueprint;
mod cache;
mod frame_renderer;
mod registry;
mod state;

pub use blueprint::{
    to_binding_blueprint, BindingBlueprint, BlueprintKind, GeometryKind, Material, VertexLayout,
};
pub use cache::{
    GeometryCache, GeometryRecord, IndexRecord, MemoCache, NodeResourceBundle, PipelineCache,
    PipelineKey,
};
pub use frame_renderer::{FrameRenderer, FrameStats, NODE_UNIFORM_SIZE};
pub use registry::{Disposer, ResourceRegistry};
pub use state::{BlendMode, CullMode, RenderState, DEPTH_FORMAT};

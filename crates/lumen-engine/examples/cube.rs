//! Spinning cube with a ring of points around it.
//!
//! `LUMEN_BACKEND=vulkan|webgpu|fallback` forces a backend.

use std::sync::Arc;
use std::time::Instant;

use glam::{Mat4, Vec3};
use lumen_engine::device::RendererConfig;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::render::Material;
use lumen_engine::scene::{
    CameraSource, FlatScene, MeshGeometry, MeshNode, PerspectiveCamera, PointCloud, PointInstance, PointsNode,
    SceneSource,
};
use lumen_engine::window::{AppControl, Runtime, RuntimeConfig, ViewerApp};

const RING_POINTS: usize = 256;

struct Demo {
    scene: FlatScene,
    camera: PerspectiveCamera,
    started: Instant,
}

impl Demo {
    fn new() -> Self {
        let mut scene = FlatScene::new();
        scene.add_mesh(MeshNode::new(Arc::new(MeshGeometry::cube()), Arc::new(Material::unlit())));

        let ring: Vec<PointInstance> = (0..RING_POINTS)
            .map(|i| {
                let t = i as f32 / RING_POINTS as f32 * std::f32::consts::TAU;
                PointInstance {
                    position: [2.0 * t.cos(), 0.0, 2.0 * t.sin()],
                    color: [0.5 + 0.5 * t.cos(), 0.5 + 0.5 * t.sin(), 1.0],
                    size: 1.0,
                    extra: [0.0; 4],
                }
            })
            .collect();
        scene.add_points(PointsNode::new(
            Arc::new(PointCloud::from_instances(&ring)),
            Arc::new(Material::points()),
        ));

        Self {
            scene,
            camera: PerspectiveCamera::new(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, 16.0 / 9.0),
            started: Instant::now(),
        }
    }
}

impl ViewerApp for Demo {
    fn update(&mut self, surface_size: (u32, u32)) -> AppControl {
        let t = self.started.elapsed().as_secs_f32();
        self.camera.set_viewport(surface_size.0, surface_size.1);
        self.camera.eye = Vec3::new(5.0 * (t * 0.3).sin(), 2.0, 5.0 * (t * 0.3).cos());

        if let Some(cube) = self.scene.meshes.first_mut() {
            cube.world = Mat4::from_rotation_y(t);
        }
        AppControl::Continue
    }

    fn view(&mut self) -> (&mut dyn SceneSource, &mut dyn CameraSource) {
        (&mut self.scene, &mut self.camera)
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RendererConfig::builder()
        .backend_from_env()
        .sample_count(4)
        .build()?;

    Runtime::run(
        RuntimeConfig {
            title: "lumen cube".to_string(),
            ..RuntimeConfig::default()
        },
        config,
        Demo::new(),
    )
}

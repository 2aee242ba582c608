/// Depth format of the target every pipeline renders against.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendMode {
    #[default]
    Opaque,
    /// Straight (non-premultiplied) alpha.
    Alpha,
    Additive,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum CullMode {
    #[default]
    None,
    Front,
    Back,
}

/// Fixed-function state baked into a pipeline. Part of the pipeline key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RenderState {
    pub blend: BlendMode,
    pub depth_test: bool,
    pub depth_write: bool,
    pub cull: CullMode,
}

impl RenderState {
    pub const OPAQUE: RenderState = RenderState {
        blend: BlendMode::Opaque,
        depth_test: true,
        depth_write: true,
        cull: CullMode::Back,
    };

    pub const TRANSPARENT: RenderState = RenderState {
        blend: BlendMode::Alpha,
        depth_test: true,
        depth_write: false,
        cull: CullMode::None,
    };

    pub const ADDITIVE: RenderState = RenderState {
        blend: BlendMode::Additive,
        depth_test: true,
        depth_write: false,
        cull: CullMode::None,
    };

    pub fn with_cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }

    pub fn blend_state(&self) -> Option<wgpu::BlendState> {
        match self.blend {
            BlendMode::Opaque => None,
            BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
            BlendMode::Additive => {
                let add = wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                };
                Some(wgpu::BlendState {
                    color: add,
                    alpha: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::One,
                        dst_factor: wgpu::BlendFactor::One,
                        operation: wgpu::BlendOperation::Add,
                    },
                })
            }
        }
    }

    pub fn cull_face(&self) -> Option<wgpu::Face> {
        match self.cull {
            CullMode::None => None,
            CullMode::Front => Some(wgpu::Face::Front),
            CullMode::Back => Some(wgpu::Face::Back),
        }
    }

    /// Depth state against [`DEPTH_FORMAT`]. A disabled test still needs the
    /// attachment format, so it becomes `Always`.
    pub fn depth_stencil(&self) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: self.depth_write,
            depth_compare: if self.depth_test {
                wgpu::CompareFunction::LessEqual
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn presets_are_distinct_keys() {
        let set: HashSet<RenderState> = [
            RenderState::OPAQUE,
            RenderState::TRANSPARENT,
            RenderState::ADDITIVE,
            RenderState::OPAQUE,
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn structural_equality() {
        let a = RenderState::OPAQUE.with_cull(CullMode::None);
        let b = RenderState { cull: CullMode::None, ..RenderState::OPAQUE };
        assert_eq!(a, b);
        assert_ne!(a, RenderState::OPAQUE);
    }

    #[test]
    fn opaque_writes_depth_without_blending() {
        let s = RenderState::OPAQUE;
        assert!(s.blend_state().is_none());
        assert_eq!(s.cull_face(), Some(wgpu::Face::Back));
        let ds = s.depth_stencil();
        assert!(ds.depth_write_enabled);
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::LessEqual);
    }

    #[test]
    fn disabled_depth_test_always_passes() {
        let s = RenderState { depth_test: false, ..RenderState::TRANSPARENT };
        assert_eq!(s.depth_stencil().depth_compare, wgpu::CompareFunction::Always);
        assert_eq!(s.blend_state(), Some(wgpu::BlendState::ALPHA_BLENDING));
    }

    #[test]
    fn additive_adds_destination() {
        let blend = RenderState::ADDITIVE.blend_state().unwrap();
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(blend.color.operation, wgpu::BlendOperation::Add);
    }
}

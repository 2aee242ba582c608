use thiserror::Error;

use super::BackendKind;

/// Invalid renderer configuration. Reported while building the config,
/// before any device negotiation.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("invalid multisample count {0}; expected one of 1, 2, 4, 8, 16")]
    InvalidSampleCount(u32),

    #[error("unknown backend '{0}'; expected vulkan, webgpu or fallback")]
    UnknownBackend(String),
}

/// Renderer initialization failure, one variant per negotiation step.
///
/// Failures are not retried here. Callers that want another attempt should
/// retry with a different backend preference.
#[derive(Debug, Clone, Error)]
pub enum RendererInitError {
    #[error(
        "no graphics support on {platform} (detected backends: {}; required features: {})",
        join(.detected_backends),
        join(.required_features)
    )]
    NoGraphicsSupport {
        platform: String,
        detected_backends: Vec<BackendKind>,
        required_features: Vec<String>,
    },

    #[error("adapter request failed on {backend}: {reason}")]
    AdapterRequestFailed { backend: BackendKind, reason: String },

    #[error("device creation failed on {backend} ({adapter}): {reason}")]
    DeviceCreationFailed {
        backend: BackendKind,
        adapter: String,
        reason: String,
    },

    #[error("surface creation failed on {backend} for {surface_kind}")]
    SurfaceCreationFailed {
        backend: BackendKind,
        surface_kind: String,
    },

    #[error("shader '{shader}' failed to compile:\n{}", .diagnostics.join("\n"))]
    ShaderCompilationFailed {
        shader: String,
        diagnostics: Vec<String>,
    },
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Swapchain frame acquisition failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AcquireError {
    /// Surface no longer matches the window (resize, rotation).
    Outdated,
    /// Surface was lost and must be reconfigured.
    Lost,
    Timeout,
    OutOfMemory,
    Other,
}

/// What the lifecycle does about an [`AcquireError`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Reconfigure at the last known size, then skip the frame.
    Reconfigure,
    /// Skip the frame and try again next time.
    SkipFrame,
}

impl AcquireError {
    pub fn action(self) -> SurfaceErrorAction {
        match self {
            AcquireError::Outdated | AcquireError::Lost => SurfaceErrorAction::Reconfigure,
            AcquireError::Timeout | AcquireError::OutOfMemory | AcquireError::Other => {
                SurfaceErrorAction::SkipFrame
            }
        }
    }
}

impl From<wgpu::SurfaceError> for AcquireError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Outdated => AcquireError::Outdated,
            wgpu::SurfaceError::Lost => AcquireError::Lost,
            wgpu::SurfaceError::Timeout => AcquireError::Timeout,
            wgpu::SurfaceError::OutOfMemory => AcquireError::OutOfMemory,
            wgpu::SurfaceError::Other => AcquireError::Other,
        }
    }
}

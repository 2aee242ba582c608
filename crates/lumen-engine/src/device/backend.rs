use std::fmt;
use std::str::FromStr;

use super::ConfigError;

/// Graphics backend family.
///
/// The set is closed: two primary APIs and one fallback. The fallback is what
/// automatic selection lands on when neither primary API yields an adapter.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BackendKind {
    /// Immediate, explicit low-level API.
    Vulkan,
    /// WebGPU-style API: browser WebGPU, or Metal / DX12 natively.
    WebGpu,
    /// GL. Never required; only picked automatically or on explicit request.
    Fallback,
}

impl BackendKind {
    /// Candidate order used when no backend is preferred.
    pub const AUTO_ORDER: [BackendKind; 3] =
        [BackendKind::Vulkan, BackendKind::WebGpu, BackendKind::Fallback];

    /// wgpu backend bits for this family.
    pub fn wgpu_backends(self) -> wgpu::Backends {
        match self {
            BackendKind::Vulkan => wgpu::Backends::VULKAN,
            BackendKind::WebGpu => {
                wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::METAL | wgpu::Backends::DX12
            }
            BackendKind::Fallback => wgpu::Backends::GL,
        }
    }

    /// Classifies the backend an adapter actually runs on.
    pub fn from_wgpu(backend: wgpu::Backend) -> Self {
        match backend {
            wgpu::Backend::Vulkan => BackendKind::Vulkan,
            wgpu::Backend::Metal | wgpu::Backend::Dx12 | wgpu::Backend::BrowserWebGpu => {
                BackendKind::WebGpu
            }
            _ => BackendKind::Fallback,
        }
    }

    #[inline]
    pub fn is_fallback(self) -> bool {
        self == BackendKind::Fallback
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Vulkan => "vulkan",
            BackendKind::WebGpu => "webgpu",
            BackendKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vulkan" | "vk" => Ok(BackendKind::Vulkan),
            "webgpu" | "wgpu" | "metal" | "dx12" => Ok(BackendKind::WebGpu),
            "fallback" | "gl" | "gles" => Ok(BackendKind::Fallback),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

/// Backends to try, in order, for a given preference.
///
/// An explicit preference is the only candidate; automatic selection walks
/// [`BackendKind::AUTO_ORDER`].
pub fn candidate_backends(preferred: Option<BackendKind>) -> Vec<BackendKind> {
    match preferred {
        Some(kind) => vec![kind],
        None => BackendKind::AUTO_ORDER.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_selection_tries_primaries_before_fallback() {
        let order = candidate_backends(None);
        assert_eq!(order, vec![BackendKind::Vulkan, BackendKind::WebGpu, BackendKind::Fallback]);
        assert!(order.last().copied().is_some_and(BackendKind::is_fallback));
    }

    #[test]
    fn explicit_preference_is_the_only_candidate() {
        assert_eq!(candidate_backends(Some(BackendKind::WebGpu)), vec![BackendKind::WebGpu]);
        assert_eq!(candidate_backends(Some(BackendKind::Fallback)), vec![BackendKind::Fallback]);
    }

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("Vulkan".parse::<BackendKind>().ok(), Some(BackendKind::Vulkan));
        assert_eq!(" metal ".parse::<BackendKind>().ok(), Some(BackendKind::WebGpu));
        assert_eq!("GL".parse::<BackendKind>().ok(), Some(BackendKind::Fallback));
    }

    #[test]
    fn unknown_backend_name_is_rejected() {
        let err = "glide".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(name) if name == "glide"));
    }

    #[test]
    fn adapter_backends_classify_into_families() {
        assert_eq!(BackendKind::from_wgpu(wgpu::Backend::Vulkan), BackendKind::Vulkan);
        assert_eq!(BackendKind::from_wgpu(wgpu::Backend::Metal), BackendKind::WebGpu);
        assert_eq!(BackendKind::from_wgpu(wgpu::Backend::Dx12), BackendKind::WebGpu);
        assert_eq!(BackendKind::from_wgpu(wgpu::Backend::Gl), BackendKind::Fallback);
    }

    #[test]
    fn families_do_not_overlap() {
        let vk = BackendKind::Vulkan.wgpu_backends();
        let web = BackendKind::WebGpu.wgpu_backends();
        let gl = BackendKind::Fallback.wgpu_backends();
        assert!((vk & web).is_empty());
        assert!((vk & gl).is_empty());
        assert!((web & gl).is_empty());
    }
}

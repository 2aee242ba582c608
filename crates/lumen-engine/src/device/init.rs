use super::{BackendKind, ConfigError};

/// Environment variable read by [`RendererConfigBuilder::backend_from_env`].
pub const BACKEND_ENV_VAR: &str = "LUMEN_BACKEND";

/// Adapter power preference.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum PowerPreference {
    LowPower,
    #[default]
    HighPerformance,
}

impl PowerPreference {
    pub fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Multisample count. Only 1, 2, 4, 8 and 16 are representable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SampleCount(u32);

impl SampleCount {
    pub const ONE: SampleCount = SampleCount(1);
    pub const ALLOWED: [u32; 5] = [1, 2, 4, 8, 16];

    pub fn new(count: u32) -> Result<Self, ConfigError> {
        if Self::ALLOWED.contains(&count) {
            Ok(Self(count))
        } else {
            Err(ConfigError::InvalidSampleCount(count))
        }
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_multisampled(self) -> bool {
        self.0 > 1
    }
}

impl Default for SampleCount {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for SampleCount {
    type Error = ConfigError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

/// Renderer configuration consumed by `Renderer::initialize`.
///
/// Every field is already validated; the only way to get an invalid
/// multisample count in here is not to have one.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// `None` selects a backend automatically.
    pub preferred_backend: Option<BackendKind>,

    pub power_preference: PowerPreference,

    pub sample_count: SampleCount,

    /// Vsync on maps to `AutoVsync`, off to `AutoNoVsync`.
    pub vsync: bool,

    /// Enables backend validation / debug layers when available.
    pub validation: bool,

    /// Prefer an sRGB surface format when the surface offers one.
    pub prefer_srgb: bool,

    /// Color the render pass clears to each frame.
    pub clear_color: wgpu::Color,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            preferred_backend: None,
            power_preference: PowerPreference::HighPerformance,
            sample_count: SampleCount::ONE,
            vsync: true,
            validation: cfg!(debug_assertions),
            prefer_srgb: true,
            clear_color: wgpu::Color::BLACK,
        }
    }
}

impl RendererConfig {
    pub fn builder() -> RendererConfigBuilder {
        RendererConfigBuilder::default()
    }

    /// Present mode derived from the vsync flag.
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}

/// Builder for [`RendererConfig`].
///
/// Raw values are held until [`build`](Self::build), which is where invalid
/// input is reported.
#[derive(Debug, Clone, Default)]
pub struct RendererConfigBuilder {
    preferred_backend: Option<BackendKind>,
    backend_name: Option<String>,
    power_preference: Option<PowerPreference>,
    sample_count: Option<u32>,
    vsync: Option<bool>,
    validation: Option<bool>,
    prefer_srgb: Option<bool>,
    clear_color: Option<wgpu::Color>,
}

impl RendererConfigBuilder {
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.preferred_backend = Some(backend);
        self.backend_name = None;
        self
    }

    /// Backend by name (see `BackendKind::from_str`); parsed in `build`.
    pub fn backend_name(mut self, name: impl Into<String>) -> Self {
        self.backend_name = Some(name.into());
        self
    }

    /// Reads the backend name from `LUMEN_BACKEND` if it is set.
    pub fn backend_from_env(self) -> Self {
        match std::env::var(BACKEND_ENV_VAR) {
            Ok(name) if !name.trim().is_empty() => self.backend_name(name),
            _ => self,
        }
    }

    pub fn power_preference(mut self, pref: PowerPreference) -> Self {
        self.power_preference = Some(pref);
        self
    }

    pub fn sample_count(mut self, count: u32) -> Self {
        self.sample_count = Some(count);
        self
    }

    pub fn vsync(mut self, on: bool) -> Self {
        self.vsync = Some(on);
        self
    }

    pub fn validation(mut self, on: bool) -> Self {
        self.validation = Some(on);
        self
    }

    pub fn prefer_srgb(mut self, on: bool) -> Self {
        self.prefer_srgb = Some(on);
        self
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = Some(color);
        self
    }

    pub fn build(self) -> Result<RendererConfig, ConfigError> {
        let defaults = RendererConfig::default();

        let sample_count = match self.sample_count {
            Some(count) => SampleCount::new(count)?,
            None => defaults.sample_count,
        };

        let preferred_backend = match self.backend_name {
            Some(name) => Some(name.parse::<BackendKind>()?),
            None => self.preferred_backend,
        };

        Ok(RendererConfig {
            preferred_backend,
            power_preference: self.power_preference.unwrap_or(defaults.power_preference),
            sample_count,
            vsync: self.vsync.unwrap_or(defaults.vsync),
            validation: self.validation.unwrap_or(defaults.validation),
            prefer_srgb: self.prefer_srgb.unwrap_or(defaults.prefer_srgb),
            clear_color: self.clear_color.unwrap_or(defaults.clear_color),
        })
    }
}

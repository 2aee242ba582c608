use super::RendererInitError;

/// Built-in shader modules. Each exposes `vs_main` and `fs_main`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderId {
    UnlitColor,
    Points,
}

impl ShaderId {
    pub const ALL: [ShaderId; 2] = [ShaderId::UnlitColor, ShaderId::Points];

    pub fn name(self) -> &'static str {
        match self {
            ShaderId::UnlitColor => "unlit_color",
            ShaderId::Points => "points",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            ShaderId::UnlitColor => include_str!("shaders/unlit_color.wgsl"),
            ShaderId::Points => include_str!("shaders/points.wgsl"),
        }
    }
}

/// Compiled built-in shaders for one device.
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    unlit_color: wgpu::ShaderModule,
    points: wgpu::ShaderModule,
}

impl ShaderLibrary {
    /// Compiles every built-in shader. Compiler errors are collected per
    /// module and reported as `ShaderCompilationFailed`.
    pub async fn compile(device: &wgpu::Device) -> Result<Self, RendererInitError> {
        Ok(Self {
            unlit_color: compile_one(device, ShaderId::UnlitColor).await?,
            points: compile_one(device, ShaderId::Points).await?,
        })
    }

    pub fn module(&self, id: ShaderId) -> &wgpu::ShaderModule {
        match id {
            ShaderId::UnlitColor => &self.unlit_color,
            ShaderId::Points => &self.points,
        }
    }
}

async fn compile_one(device: &wgpu::Device, id: ShaderId) -> Result<wgpu::ShaderModule, RendererInitError> {
    // Native backends report invalid WGSL through the device error handler,
    // which panics unless a scope captures it.
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(id.name()),
        source: wgpu::ShaderSource::Wgsl(id.source().into()),
    });
    let scope_error = scope.pop().await;

    let info = module.get_compilation_info().await;
    check_compiled(id, scope_error.as_ref(), &info)?;

    for msg in &info.messages {
        log::debug!("shader {}: {}", id.name(), format_message(msg));
    }
    Ok(module)
}

fn check_compiled(
    id: ShaderId,
    scope_error: Option<&wgpu::Error>,
    info: &wgpu::CompilationInfo,
) -> Result<(), RendererInitError> {
    let mut diagnostics = error_diagnostics(info);
    if let Some(err) = scope_error {
        let text = match err {
            wgpu::Error::Validation { description, .. } => description.clone(),
            other => other.to_string(),
        };
        let repeated = info
            .messages
            .iter()
            .any(|m| m.message_type == wgpu::CompilationMessageType::Error && text.contains(&m.message));
        if !repeated {
            diagnostics.push(text);
        }
    }

    if diagnostics.is_empty() {
        return Ok(());
    }
    Err(RendererInitError::ShaderCompilationFailed {
        shader: id.name().to_string(),
        diagnostics,
    })
}

fn error_diagnostics(info: &wgpu::CompilationInfo) -> Vec<String> {
    info.messages
        .iter()
        .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
        .map(format_message)
        .collect()
}

fn format_message(msg: &wgpu::CompilationMessage) -> String {
    match &msg.location {
        Some(loc) => format!("{}:{}: {}", loc.line_number, loc.line_position, msg.message),
        None => msg.message.clone(),
    }
}

use std::fmt;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Category of a GPU-side failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GpuErrorCode {
    NoAdapter,
    DeviceRequest,
    SurfaceCreate,
    SurfaceUnsupported,
    ShaderCompile,
    TextureTooLarge,
    OutOfMemory,
}

impl GpuErrorCode {
    /// Human-readable description of the code.
    pub fn message(self) -> &'static str {
        match self {
            Self::NoAdapter => "no suitable GPU adapter",
            Self::DeviceRequest => "GPU device could not be created",
            Self::SurfaceCreate => "surface could not be created",
            Self::SurfaceUnsupported => "surface is not supported by the adapter",
            Self::ShaderCompile => "shader failed to compile",
            Self::TextureTooLarge => "texture exceeds the device's maximum dimension",
            Self::OutOfMemory => "out of GPU memory",
        }
    }
}

impl fmt::Display for GpuErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuError {
    pub code: GpuErrorCode,
    pub detail: String,
}

impl GpuError {
    pub fn new(code: GpuErrorCode, detail: impl Into<String>) -> Self {
        Self { code, detail: detail.into() }
    }
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.detail)
        }
    }
}

impl std::error::Error for GpuError {}

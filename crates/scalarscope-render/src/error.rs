//! Rendering error types.

use scalarscope_core::ScalarscopeError;
use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Shader assembly failed.
    #[error("shader compilation failed: {0}")]
    ShaderCompilationFailed(String),

    /// A color map name is not registered.
    #[error("unknown color map '{0}'")]
    UnknownColorMap(String),

    /// Failed to read a color map image.
    #[error("failed to load color map image: {0}")]
    ImageLoadFailed(#[from] image::ImageError),

    /// A handle does not refer to a live resource.
    #[error("invalid {0} handle")]
    InvalidHandle(&'static str),

    /// Uploaded data does not match its declared shape.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A draw was issued before a render target was set.
    #[error("no render target set")]
    NoRenderTarget,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for ScalarscopeError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::UnknownColorMap(name) => ScalarscopeError::MissingColorMap(name),
            other => ScalarscopeError::RenderError(other.to_string()),
        }
    }
}

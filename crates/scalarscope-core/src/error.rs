//! Error types for scalarscope.

use thiserror::Error;

use crate::quantity::AttachmentKind;

/// The main error type for scalarscope operations.
#[derive(Error, Debug)]
pub enum ScalarscopeError {
    /// A value buffer does not match the element count of its attachment kind.
    #[error(
        "quantity '{quantity}' has {actual} values, but the mesh has {expected} {} elements",
        kind.as_str()
    )]
    DimensionMismatch {
        quantity: String,
        kind: AttachmentKind,
        expected: usize,
        actual: usize,
    },

    /// A quantity with the given name already exists.
    #[error("quantity '{0}' already exists on structure '{1}'")]
    QuantityExists(String, String),

    /// A quantity with the given name was not found.
    #[error("quantity '{0}' not found on structure '{1}'")]
    QuantityNotFound(String, String),

    /// Mesh connectivity refers to elements that do not exist.
    #[error("invalid mesh topology: {0}")]
    InvalidTopology(String),

    /// A texture image has a zero dimension.
    #[error("image of quantity '{0}' is empty ({1}x{2})")]
    EmptyImage(String, u32, u32),

    /// A colormap name is not registered.
    #[error("colormap '{0}' is not registered")]
    MissingColorMap(String),

    /// A texture quantity refers to a parameterization that no longer exists.
    #[error("quantity '{quantity}' refers to missing parameterization '{parameterization}'")]
    MissingParameterization {
        quantity: String,
        parameterization: String,
    },

    /// Rendering error.
    #[error("render error: {0}")]
    RenderError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for scalarscope operations.
pub type Result<T> = std::result::Result<T, ScalarscopeError>;

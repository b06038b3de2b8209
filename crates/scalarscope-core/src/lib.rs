//! Core abstractions for scalarscope.
//!
//! This crate provides the GPU-independent half of the scalar visualization pipeline:
//! - [`value_mapper`] for turning raw values into normalized colormap coordinates
//! - [`Histogram`] for density estimates and robust (outlier-resistant) default ranges
//! - [`ScalarMapping`] and the [`ScalarQuantity`] trait, the shared color-mapping state
//!   every attachment-specific scalar quantity composes
//! - The [`Quantity`] trait, attachment kinds, and configuration options

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Bucket math converts between counts and floats on purpose
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod data_type;
pub mod error;
pub mod histogram;
pub mod options;
pub mod quantity;
pub mod scalar;
pub mod value_mapper;

pub use data_type::DataType;
pub use error::{Result, ScalarscopeError};
pub use histogram::Histogram;
pub use options::ScalarOptions;
pub use quantity::{AttachmentKind, GpuState, ImageOrigin, MeshElement, Quantity, QuantityKind};
pub use scalar::{ScalarMapping, ScalarMappingSettings, ScalarQuantity};
pub use value_mapper::{normalize, DisplayRange};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3};

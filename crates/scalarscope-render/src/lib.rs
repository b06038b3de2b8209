//! Rendering backend for scalarscope.
//!
//! This crate provides the rendering-engine side of the scalar pipeline:
//! - The [`RenderBackend`] trait quantities talk to, with a wgpu implementation
//!   ([`WgpuBackend`]) and a headless one that records every call ([`RecordingBackend`])
//! - WGSL shader variants, one per attachment layout
//! - The color map registry and lookup-table generation

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod backend;
pub mod color_maps;
pub mod error;
pub mod recording;
pub mod scalar_render;
pub mod shader;
pub mod wgpu_backend;

pub use backend::{
    AttributeLayout, BufferHandle, DrawCall, MeshGeometryBuffers, ProgramDesc, ProgramHandle,
    RenderBackend, ScalarSource, TextureFilter, TextureHandle,
};
pub use color_maps::{ColorMap, ColorMapRegistry, COLORMAP_RESOLUTION};
pub use error::{RenderError, RenderResult};
pub use recording::{BackendStats, RecordedDraw, RecordingBackend, MAX_RECORDED_DRAWS};
pub use scalar_render::{FrameUniforms, ScalarUniforms};
pub use shader::{ScalarShaderVariant, ShaderBuilder};
pub use wgpu_backend::WgpuBackend;

//! scalarscope: scalar field visualization on surface meshes.
//!
//! Scalar data attached to the vertices, faces, edges, halfedges or corners of a
//! mesh (or to a texture sampled through a UV parameterization) is mapped through
//! a display range and a colormap, and drawn with a [`RenderBackend`].
//!
//! # Quick Start
//!
//! ```no_run
//! use scalarscope::*;
//!
//! fn main() -> Result<()> {
//!     init();
//!
//!     let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
//!     let mut mesh = SurfaceMesh::from_triangles("tri", vertices, &[[0, 1, 2]])?;
//!     mesh.add_vertex_scalar_quantity("height", vec![0.0, 1.0, 2.0], DataType::Standard)?
//!         .set_color_map("reds")
//!         .set_enabled(true);
//!
//!     let color_maps = ColorMapRegistry::new();
//!     let mut backend = RecordingBackend::new();
//!     mesh.draw(&mut backend, &color_maps)?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`ScalarMapping`] holds the values, their [`Histogram`], the [`DataType`]
//!   policy, the display range and the colormap name. [`normalize`] is the CPU
//!   reference of what the shaders compute.
//! - The [`SurfaceQuantity`] implementations own a mapping and build GPU resources
//!   lazily: setters only mark state stale, and the next draw rebuilds what changed.
//! - [`RenderBackend`] is implemented by [`WgpuBackend`] and by the headless
//!   [`RecordingBackend`].

// Re-export core types
pub use scalarscope_core::{
    normalize, AttachmentKind, DataType, DisplayRange, GpuState, Histogram, ImageOrigin,
    MeshElement, Quantity, QuantityKind, Result, ScalarMapping, ScalarMappingSettings,
    ScalarOptions, ScalarQuantity, ScalarscopeError, Mat4, Vec2, Vec3,
};

// Re-export render types
pub use scalarscope_render::{
    BackendStats, ColorMap, ColorMapRegistry, RecordedDraw, RecordingBackend, RenderBackend,
    RenderError, ScalarShaderVariant, ScalarSource, ScalarUniforms, TextureFilter, WgpuBackend,
};

// Re-export UI builders
pub use scalarscope_ui::{build_scalar_options_ui, histogram_range_widget, HistogramEdit};

// Re-export structures
pub use scalarscope_structures::{
    MeshGeometry, ParamDomain, RebuildStats, SurfaceCornerScalarQuantity,
    SurfaceEdgeScalarQuantity, SurfaceFaceScalarQuantity, SurfaceHalfedgeScalarQuantity,
    SurfaceMesh, SurfaceParameterizationQuantity, SurfaceQuantity,
    SurfaceTextureScalarQuantity, SurfaceVertexScalarQuantity,
};

/// Initializes logging from `RUST_LOG`. Safe to call more than once.
pub fn init() {
    if env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .try_init()
        .is_ok()
    {
        log::info!("scalarscope initialized");
    }
}

/// Creates a wgpu backend rendering to offscreen targets.
///
/// Fails if no GPU adapter (real or software fallback) is available.
pub fn create_headless_backend() -> Result<WgpuBackend> {
    let backend = pollster::block_on(WgpuBackend::new_headless())?;
    log::info!("created headless wgpu backend");
    Ok(backend)
}

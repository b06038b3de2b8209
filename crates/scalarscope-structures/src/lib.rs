//! Structure implementations for scalarscope.
//!
//! This crate provides the [`SurfaceMesh`] structure and the scalar quantities that
//! can be attached to its vertices, faces, edges, halfedges, corners, or to a texture
//! sampled through a UV parameterization.

// Graphics code intentionally uses casts for indices and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod surface_mesh;

pub use surface_mesh::{
    DrawContext, MeshGeometry, ParamDomain, RebuildStats, SurfaceCornerScalarQuantity,
    SurfaceEdgeScalarQuantity, SurfaceFaceScalarQuantity, SurfaceHalfedgeScalarQuantity,
    SurfaceMesh, SurfaceParameterizationQuantity, SurfaceQuantity, SurfaceScalarQuantity,
    SurfaceTextureScalarQuantity, SurfaceVertexScalarQuantity,
};

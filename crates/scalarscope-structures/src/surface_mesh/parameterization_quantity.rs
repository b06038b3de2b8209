//! Parameterization (UV) quantities for surface meshes.

use glam::Vec2;
use scalarscope_core::{Quantity, QuantityKind};

use super::geometry::MeshGeometry;

/// Which mesh element the UV coordinates are stored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDomain {
    /// One coordinate per vertex; shared across faces.
    Vertex,
    /// One coordinate per corner; allows seams.
    Corner,
}

/// UV coordinates texture-attached scalars are sampled through.
#[derive(Debug, Clone)]
pub struct SurfaceParameterizationQuantity {
    name: String,
    structure_name: String,
    domain: ParamDomain,
    coords: Vec<Vec2>,
    enabled: bool,
    id: u64,
    revision: u64,
}

impl SurfaceParameterizationQuantity {
    pub(crate) fn new(
        name: impl Into<String>,
        structure_name: impl Into<String>,
        domain: ParamDomain,
        coords: Vec<Vec2>,
        id: u64,
    ) -> Self {
        Self {
            name: name.into(),
            structure_name: structure_name.into(),
            domain,
            coords,
            enabled: false,
            id,
            revision: 0,
        }
    }

    pub fn domain(&self) -> ParamDomain {
        self.domain
    }

    /// Returns the UV coordinates.
    pub fn coords(&self) -> &[Vec2] {
        &self.coords
    }

    /// Replaces the coordinates. Length is checked by the owning mesh.
    pub(crate) fn set_coords(&mut self, coords: Vec<Vec2>) {
        self.coords = coords;
        self.revision += 1;
    }

    /// Bumped every time the coordinates change, so dependents know to re-upload.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Identifies this parameterization within its mesh. A parameterization removed
    /// and added again under the same name gets a new id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The `(id, revision)` pair dependents compare to detect any change.
    pub fn version(&self) -> (u64, u64) {
        (self.id, self.revision)
    }

    /// Texture coordinates as one `vec2` per rendered vertex.
    pub fn texcoords(&self, geometry: &MeshGeometry) -> Vec<f32> {
        match self.domain {
            ParamDomain::Vertex => geometry.expand_vertex_uvs(&self.coords),
            ParamDomain::Corner => geometry.expand_corner_uvs(&self.coords),
        }
    }
}

impl Quantity for SurfaceParameterizationQuantity {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn structure_name(&self) -> &str {
        &self.structure_name
    }

    fn kind(&self) -> QuantityKind {
        QuantityKind::Parameterization
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn refresh(&mut self) {
        self.revision += 1;
    }

    fn data_size(&self) -> usize {
        self.coords.len()
    }
}

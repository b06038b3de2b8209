//! Surface mesh structure.

mod geometry;
mod parameterization_quantity;
mod quantity_methods;
mod scalar_quantity;
mod texture_scalar_quantity;

pub use geometry::MeshGeometry;
pub use parameterization_quantity::{ParamDomain, SurfaceParameterizationQuantity};
pub use scalar_quantity::{
    DrawContext, RebuildStats, SurfaceCornerScalarQuantity, SurfaceEdgeScalarQuantity,
    SurfaceFaceScalarQuantity, SurfaceHalfedgeScalarQuantity, SurfaceQuantity,
    SurfaceScalarQuantity, SurfaceVertexScalarQuantity,
};
pub use texture_scalar_quantity::SurfaceTextureScalarQuantity;

use glam::{Mat4, Vec3};
use scalarscope_core::{
    AttachmentKind, GpuState, MeshElement, Quantity, Result, ScalarOptions, ScalarscopeError,
};
use scalarscope_render::{
    AttributeLayout, ColorMapRegistry, MeshGeometryBuffers, RenderBackend,
};

/// A surface mesh (triangular or polygonal) owning a set of scalar quantities.
pub struct SurfaceMesh {
    name: String,
    geometry: MeshGeometry,
    enabled: bool,
    transform: Mat4,
    options: ScalarOptions,
    quantities: Vec<Box<dyn SurfaceQuantity>>,
    parameterizations: Vec<SurfaceParameterizationQuantity>,
    next_parameterization_id: u64,

    // GPU resources
    geometry_buffers: Option<MeshGeometryBuffers>,
    geometry_state: GpuState,
}

impl SurfaceMesh {
    /// Creates a new surface mesh from vertices and polygon faces.
    ///
    /// Each face is a variable-length list of vertex indices forming a polygon.
    /// Faces with fewer than three vertices or out-of-range indices are rejected.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vec3>,
        faces: Vec<Vec<u32>>,
    ) -> Result<Self> {
        let name = name.into();
        let geometry = MeshGeometry::new(vertices, faces)?;
        log::debug!(
            "created mesh '{}' with {} vertices, {} faces, {} edges",
            name,
            geometry.num_vertices(),
            geometry.num_faces(),
            geometry.num_edges()
        );
        Ok(Self {
            name,
            geometry,
            enabled: true,
            transform: Mat4::IDENTITY,
            options: ScalarOptions::default(),
            quantities: Vec::new(),
            parameterizations: Vec::new(),
            next_parameterization_id: 0,
            geometry_buffers: None,
            geometry_state: GpuState::Absent,
        })
    }

    /// Creates a new surface mesh from triangles.
    pub fn from_triangles(
        name: impl Into<String>,
        vertices: Vec<Vec3>,
        triangles: &[[u32; 3]],
    ) -> Result<Self> {
        let faces = triangles.iter().map(|t| t.to_vec()).collect();
        Self::new(name, vertices, faces)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    pub fn num_vertices(&self) -> usize {
        self.geometry.num_vertices()
    }

    pub fn num_faces(&self) -> usize {
        self.geometry.num_faces()
    }

    pub fn num_edges(&self) -> usize {
        self.geometry.num_edges()
    }

    pub fn num_halfedges(&self) -> usize {
        self.geometry.num_halfedges()
    }

    pub fn num_corners(&self) -> usize {
        self.geometry.num_corners()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    /// Options handed to quantities created from now on.
    pub fn options(&self) -> &ScalarOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ScalarOptions) {
        self.options = options;
    }

    /// Moves the vertices. Topology, and therefore every quantity's values, stays valid.
    pub fn update_vertex_positions(&mut self, vertices: Vec<Vec3>) -> Result<()> {
        if vertices.len() != self.num_vertices() {
            return Err(ScalarscopeError::DimensionMismatch {
                quantity: format!("{} positions", self.name),
                kind: AttachmentKind::Vertex,
                expected: self.num_vertices(),
                actual: vertices.len(),
            });
        }
        self.geometry.set_vertices(vertices);
        self.geometry_state.invalidate();
        Ok(())
    }

    /// Marks every GPU resource of the mesh and its quantities stale.
    pub fn refresh(&mut self) {
        self.geometry_state.invalidate();
        for quantity in &mut self.quantities {
            quantity.refresh();
        }
    }

    /// Returns the geometry buffers, uploading them if stale.
    fn ensure_geometry_buffers(
        &mut self,
        backend: &mut dyn RenderBackend,
    ) -> Result<MeshGeometryBuffers> {
        if let (Some(buffers), false) = (self.geometry_buffers, self.geometry_state.needs_build()) {
            return Ok(buffers);
        }
        let label = |part: &str| format!("{} {part}", self.name);
        let buffers = MeshGeometryBuffers {
            positions: backend.create_attribute_buffer(
                &label("positions"),
                AttributeLayout::Triple,
                &self.geometry.expand_positions(),
            )?,
            normals: backend.create_attribute_buffer(
                &label("normals"),
                AttributeLayout::Triple,
                &self.geometry.expand_normals(),
            )?,
            barycentrics: backend.create_attribute_buffer(
                &label("barycentrics"),
                AttributeLayout::Triple,
                &self.geometry.expand_barycentrics(),
            )?,
            edge_is_real: backend.create_attribute_buffer(
                &label("edge flags"),
                AttributeLayout::Triple,
                &self.geometry.expand_edge_is_real(),
            )?,
            vertex_count: self.geometry.num_rendered_vertices() as u32,
        };
        if let Some(old) = self.geometry_buffers.replace(buffers) {
            release_geometry_buffers(backend, old);
        }
        self.geometry_state = GpuState::Ready;
        log::debug!(
            "uploaded geometry of '{}' ({} rendered vertices)",
            self.name,
            buffers.vertex_count
        );
        Ok(buffers)
    }

    /// Draws every enabled quantity. Stops at the first quantity that fails.
    pub fn draw(
        &mut self,
        backend: &mut dyn RenderBackend,
        color_maps: &ColorMapRegistry,
    ) -> Result<()> {
        if !self.enabled || !self.quantities.iter().any(|q| q.is_enabled()) {
            return Ok(());
        }
        let geometry_buffers = self.ensure_geometry_buffers(backend)?;
        let mut ctx = DrawContext {
            backend,
            color_maps,
            geometry: &self.geometry,
            geometry_buffers: &geometry_buffers,
            parameterizations: &self.parameterizations,
            model: self.transform,
        };
        for quantity in &mut self.quantities {
            quantity.draw(&mut ctx)?;
        }
        Ok(())
    }

    /// Frees every GPU resource held by the mesh and its quantities.
    pub fn release_gpu_resources(&mut self, backend: &mut dyn RenderBackend) {
        for quantity in &mut self.quantities {
            quantity.release(backend);
        }
        if let Some(buffers) = self.geometry_buffers.take() {
            release_geometry_buffers(backend, buffers);
        }
        self.geometry_state = GpuState::Absent;
    }

    /// Builds the mesh panel with one entry per quantity.
    pub fn build_ui(&mut self, ui: &mut egui::Ui, color_maps: &ColorMapRegistry) {
        ui.checkbox(&mut self.enabled, self.name.as_str());
        ui.label(format!(
            "{} vertices, {} faces, {} edges",
            self.num_vertices(),
            self.num_faces(),
            self.num_edges()
        ));

        if self.quantities.is_empty() {
            return;
        }
        ui.separator();
        let mut switched_on = None;
        for (index, quantity) in self.quantities.iter_mut().enumerate() {
            if quantity.build_ui(ui, color_maps) {
                switched_on = Some(index);
            }
        }
        if let Some(index) = switched_on {
            self.disable_other_quantities(index);
        }
    }

    /// Shows the values every quantity holds at a picked element.
    pub fn build_pick_ui(&self, ui: &mut egui::Ui, element: MeshElement) {
        ui.label(format!("{} #{}", element.kind(), element.index()));
        for quantity in &self.quantities {
            quantity.build_element_info_ui(ui, element);
        }
    }

    /// Returns `(display name, value)` for every quantity with a value at `element`.
    pub fn element_values(&self, element: MeshElement) -> Vec<(String, f32)> {
        self.quantities
            .iter()
            .filter_map(|q| q.element_value(element).map(|v| (q.display_name(), v)))
            .collect()
    }

    // === Quantity access ===

    pub fn quantities(&self) -> &[Box<dyn SurfaceQuantity>] {
        &self.quantities
    }

    pub fn get_quantity(&self, name: &str) -> Option<&dyn SurfaceQuantity> {
        self.quantities
            .iter()
            .find(|q| q.name() == name)
            .map(|q| q.as_ref())
    }

    pub fn get_quantity_mut(&mut self, name: &str) -> Option<&mut Box<dyn SurfaceQuantity>> {
        self.quantities.iter_mut().find(|q| q.name() == name)
    }

    /// Gets a quantity as its concrete type.
    pub fn get_quantity_as<T: 'static>(&self, name: &str) -> Option<&T> {
        self.get_quantity(name)?.as_any().downcast_ref::<T>()
    }

    /// Gets a quantity mutably as its concrete type.
    pub fn get_quantity_as_mut<T: 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.get_quantity_mut(name)?.as_any_mut().downcast_mut::<T>()
    }

    /// Enables or disables a quantity. Enabling one disables all others, so at most
    /// one scalar colors the mesh.
    pub fn set_quantity_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let index = self
            .quantities
            .iter()
            .position(|q| q.name() == name)
            .ok_or_else(|| ScalarscopeError::QuantityNotFound(name.to_string(), self.name.clone()))?;
        self.quantities[index].set_enabled(enabled);
        if enabled {
            self.disable_other_quantities(index);
        }
        Ok(())
    }

    fn disable_other_quantities(&mut self, keep: usize) {
        for (index, quantity) in self.quantities.iter_mut().enumerate() {
            if index != keep {
                quantity.set_enabled(false);
            }
        }
    }

    /// Removes a quantity. Its GPU resources must be freed by the caller with
    /// [`SurfaceQuantity::release`], or use [`Self::remove_quantity_with_backend`].
    pub fn remove_quantity(&mut self, name: &str) -> Option<Box<dyn SurfaceQuantity>> {
        let idx = self.quantities.iter().position(|q| q.name() == name)?;
        Some(self.quantities.remove(idx))
    }

    /// Removes a quantity and releases its GPU resources on `backend`.
    ///
    /// Returns false if no quantity has that name.
    pub fn remove_quantity_with_backend(
        &mut self,
        name: &str,
        backend: &mut dyn RenderBackend,
    ) -> bool {
        match self.remove_quantity(name) {
            Some(mut quantity) => {
                quantity.release(backend);
                log::debug!("removed quantity '{name}' from mesh '{}'", self.name);
                true
            }
            None => false,
        }
    }

    pub fn parameterizations(&self) -> &[SurfaceParameterizationQuantity] {
        &self.parameterizations
    }

    pub fn get_parameterization(&self, name: &str) -> Option<&SurfaceParameterizationQuantity> {
        self.parameterizations.iter().find(|p| p.name() == name)
    }

    /// Removes a parameterization. Texture quantities sampled through it fail to draw
    /// until one with the same name is added again.
    pub fn remove_parameterization(&mut self, name: &str) -> Option<SurfaceParameterizationQuantity> {
        let idx = self.parameterizations.iter().position(|p| p.name() == name)?;
        Some(self.parameterizations.remove(idx))
    }

    fn name_in_use(&self, name: &str) -> bool {
        self.quantities.iter().any(|q| q.name() == name)
            || self.parameterizations.iter().any(|p| p.name() == name)
    }
}

fn release_geometry_buffers(backend: &mut dyn RenderBackend, buffers: MeshGeometryBuffers) {
    backend.release_buffer(buffers.positions);
    backend.release_buffer(buffers.normals);
    backend.release_buffer(buffers.barycentrics);
    backend.release_buffer(buffers.edge_is_real);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use scalarscope_core::{DataType, ScalarQuantity};
    use scalarscope_render::RecordingBackend;

    /// A quad next to a triangle sharing edge 1-2.
    fn mesh() -> SurfaceMesh {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, 0.5, 0.0),
        ];
        SurfaceMesh::new("mesh", vertices, vec![vec![0, 1, 2, 3], vec![1, 4, 2]]).unwrap()
    }

    #[test]
    fn test_element_counts() {
        let mesh = mesh();
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 6);
        assert_eq!(mesh.num_halfedges(), 7);
        assert_eq!(mesh.num_corners(), 7);
    }

    #[test]
    fn test_invalid_topology_rejected() {
        let vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let err = SurfaceMesh::new("bad", vertices.clone(), vec![vec![0, 1, 3]]);
        assert!(matches!(err, Err(ScalarscopeError::InvalidTopology(_))));
        let err = SurfaceMesh::new("bad", vertices, vec![vec![0, 1]]);
        assert!(matches!(err, Err(ScalarscopeError::InvalidTopology(_))));
    }

    #[test]
    fn test_add_checks_length_per_kind() {
        let mut mesh = mesh();
        assert!(mesh.add_vertex_scalar_quantity("v", vec![0.0; 5], DataType::Standard).is_ok());
        assert!(mesh.add_face_scalar_quantity("f", vec![0.0; 2], DataType::Standard).is_ok());
        assert!(mesh.add_edge_scalar_quantity("e", vec![0.0; 6], DataType::Standard).is_ok());
        assert!(mesh.add_halfedge_scalar_quantity("h", vec![0.0; 7], DataType::Standard).is_ok());
        assert!(mesh.add_corner_scalar_quantity("c", vec![0.0; 7], DataType::Standard).is_ok());

        let err = mesh
            .add_edge_scalar_quantity("e2", vec![0.0; 7], DataType::Standard)
            .unwrap_err();
        match err {
            ScalarscopeError::DimensionMismatch {
                kind,
                expected,
                actual,
                ..
            } => {
                assert_eq!(kind, AttachmentKind::Edge);
                assert_eq!(expected, 6);
                assert_eq!(actual, 7);
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(mesh.get_quantity("e2").is_none());
        assert_eq!(mesh.quantities().len(), 5);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut mesh = mesh();
        mesh.add_vertex_scalar_quantity("x", vec![0.0; 5], DataType::Standard)
            .unwrap();
        let err = mesh.add_face_scalar_quantity("x", vec![0.0; 2], DataType::Standard);
        assert!(matches!(err, Err(ScalarscopeError::QuantityExists(..))));
        let err = mesh.add_vertex_parameterization_quantity("x", vec![Vec2::ZERO; 5]);
        assert!(matches!(err, Err(ScalarscopeError::QuantityExists(..))));
    }

    #[test]
    fn test_enabling_one_disables_others() {
        let mut mesh = mesh();
        mesh.add_vertex_scalar_quantity("a", vec![0.0; 5], DataType::Standard)
            .unwrap();
        mesh.add_face_scalar_quantity("b", vec![0.0; 2], DataType::Standard)
            .unwrap();
        mesh.set_quantity_enabled("a", true).unwrap();
        mesh.set_quantity_enabled("b", true).unwrap();
        assert!(!mesh.get_quantity("a").unwrap().is_enabled());
        assert!(mesh.get_quantity("b").unwrap().is_enabled());
        assert!(mesh.set_quantity_enabled("missing", true).is_err());
    }

    #[test]
    fn test_element_values_for_picking() {
        let mut mesh = mesh();
        mesh.add_halfedge_scalar_quantity(
            "h",
            (0..7).map(|i| i as f32).collect(),
            DataType::Standard,
        )
        .unwrap();
        mesh.add_face_scalar_quantity("f", vec![10.0, 20.0], DataType::Standard)
            .unwrap();

        let picked = mesh.element_values(MeshElement::Halfedge(4));
        assert_eq!(picked, vec![("h (halfedge scalar)".to_string(), 4.0)]);
        let picked = mesh.element_values(MeshElement::Face(1));
        assert_eq!(picked, vec![("f (face scalar)".to_string(), 20.0)]);
        assert!(mesh.element_values(MeshElement::Face(9)).is_empty());
    }

    #[test]
    fn test_draw_builds_geometry_once() {
        let mut mesh = mesh();
        let color_maps = ColorMapRegistry::new();
        let mut backend = RecordingBackend::new();
        mesh.add_vertex_scalar_quantity("v", vec![0.0, 1.0, 2.0, 3.0, 4.0], DataType::Standard)
            .unwrap()
            .set_enabled(true);

        mesh.draw(&mut backend, &color_maps).unwrap();
        mesh.draw(&mut backend, &color_maps).unwrap();
        // 4 geometry buffers plus the value buffer
        assert_eq!(backend.stats().buffers_created, 5);
        assert_eq!(backend.stats().draw_calls, 2);
        assert_eq!(backend.last_draw().unwrap().vertex_count, 9);
    }

    #[test]
    fn test_moving_vertices_reuploads_geometry_only() {
        let mut mesh = mesh();
        let color_maps = ColorMapRegistry::new();
        let mut backend = RecordingBackend::new();
        mesh.add_face_scalar_quantity("f", vec![1.0, 2.0], DataType::Standard)
            .unwrap()
            .set_enabled(true);
        mesh.draw(&mut backend, &color_maps).unwrap();

        let moved: Vec<Vec3> = mesh
            .geometry()
            .vertices()
            .iter()
            .map(|v| *v + Vec3::Z)
            .collect();
        mesh.update_vertex_positions(moved).unwrap();
        mesh.draw(&mut backend, &color_maps).unwrap();

        assert_eq!(backend.stats().buffers_created, 9);
        assert_eq!(backend.stats().buffers_released, 4);
        let q = mesh.get_quantity("f").unwrap();
        assert_eq!(q.rebuild_stats().buffer_builds, 1);

        let err = mesh.update_vertex_positions(vec![Vec3::ZERO; 2]).unwrap_err();
        assert!(matches!(err, ScalarscopeError::DimensionMismatch { expected: 5, actual: 2, .. }));
    }

    #[test]
    fn test_disabled_mesh_draws_nothing() {
        let mut mesh = mesh();
        let mut backend = RecordingBackend::new();
        mesh.add_vertex_scalar_quantity("v", vec![0.0; 5], DataType::Standard)
            .unwrap()
            .set_enabled(true);
        mesh.set_enabled(false);
        mesh.draw(&mut backend, &ColorMapRegistry::new()).unwrap();
        assert_eq!(backend.stats(), Default::default());
    }

    #[test]
    fn test_release_frees_everything() {
        let mut mesh = mesh();
        let color_maps = ColorMapRegistry::new();
        let mut backend = RecordingBackend::new();
        mesh.add_corner_scalar_quantity("c", vec![0.5; 7], DataType::Magnitude)
            .unwrap()
            .set_enabled(true);
        mesh.draw(&mut backend, &color_maps).unwrap();
        assert_eq!(backend.live_buffers(), 5);
        assert_eq!(backend.live_programs(), 1);

        mesh.release_gpu_resources(&mut backend);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_programs(), 0);
    }

    #[test]
    fn test_remove_with_backend_releases_quantity() {
        let mut mesh = mesh();
        let color_maps = ColorMapRegistry::new();
        let mut backend = RecordingBackend::new();
        mesh.add_face_scalar_quantity("f", vec![1.0, 2.0], DataType::Standard)
            .unwrap()
            .set_enabled(true);
        mesh.draw(&mut backend, &color_maps).unwrap();
        assert_eq!(backend.live_buffers(), 5);

        assert!(mesh.remove_quantity_with_backend("f", &mut backend));
        assert!(mesh.get_quantity("f").is_none());
        assert_eq!(backend.live_programs(), 0);
        // Only the mesh's geometry buffers remain
        assert_eq!(backend.live_buffers(), 4);
        assert!(!mesh.remove_quantity_with_backend("f", &mut backend));
    }

    #[test]
    fn test_readded_parameterization_gets_new_id() {
        let mut mesh = mesh();
        let first = mesh
            .add_vertex_parameterization_quantity("uv", vec![Vec2::ZERO; 5])
            .unwrap()
            .version();
        mesh.remove_parameterization("uv").unwrap();
        let second = mesh
            .add_vertex_parameterization_quantity("uv", vec![Vec2::ONE; 5])
            .unwrap()
            .version();
        assert_ne!(first.0, second.0);
        assert_eq!(second.1, 0);
    }

    #[test]
    fn test_update_parameterization_checks_length() {
        let mut mesh = mesh();
        mesh.add_corner_parameterization_quantity("uv", vec![Vec2::ZERO; 7])
            .unwrap();
        assert!(mesh.update_parameterization("uv", vec![Vec2::ONE; 7]).is_ok());
        assert_eq!(mesh.get_parameterization("uv").unwrap().revision(), 1);
        assert!(matches!(
            mesh.update_parameterization("uv", vec![Vec2::ONE; 5]),
            Err(ScalarscopeError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            mesh.update_parameterization("nope", vec![]),
            Err(ScalarscopeError::QuantityNotFound(..))
        ));
    }

    #[test]
    fn test_downcast_and_update_values() {
        let mut mesh = mesh();
        mesh.add_vertex_scalar_quantity("v", vec![0.0; 5], DataType::Standard)
            .unwrap();
        let q = mesh
            .get_quantity_as_mut::<SurfaceVertexScalarQuantity>("v")
            .unwrap();
        assert!(q.update_values(vec![1.0; 4]).is_err());
        q.update_values(vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(q.values()[4], 5.0);
        assert!(mesh.get_quantity_as::<SurfaceFaceScalarQuantity>("v").is_none());
    }
}

//! Quantity add methods for surface meshes.
//!
//! Every add method checks that the name is unused on the mesh and that the value
//! count matches the element count of the attachment kind, so a quantity that exists
//! always agrees with the mesh topology.

use glam::Vec2;
use scalarscope_core::{AttachmentKind, DataType, Quantity, Result, ScalarscopeError};

use super::{
    ParamDomain, SurfaceCornerScalarQuantity, SurfaceEdgeScalarQuantity,
    SurfaceFaceScalarQuantity, SurfaceHalfedgeScalarQuantity, SurfaceMesh,
    SurfaceParameterizationQuantity, SurfaceQuantity, SurfaceScalarQuantity,
    SurfaceTextureScalarQuantity, SurfaceVertexScalarQuantity,
};

impl SurfaceMesh {
    /// Adds a scalar quantity with one value per vertex.
    pub fn add_vertex_scalar_quantity(
        &mut self,
        name: impl Into<String>,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&mut SurfaceVertexScalarQuantity> {
        let base = self.new_scalar_base(name.into(), AttachmentKind::Vertex, values, data_type)?;
        self.push_quantity(SurfaceVertexScalarQuantity::new(base))
    }

    /// Adds a scalar quantity with one value per face.
    pub fn add_face_scalar_quantity(
        &mut self,
        name: impl Into<String>,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&mut SurfaceFaceScalarQuantity> {
        let base = self.new_scalar_base(name.into(), AttachmentKind::Face, values, data_type)?;
        self.push_quantity(SurfaceFaceScalarQuantity::new(base))
    }

    /// Adds a scalar quantity with one value per edge, ordered as [`super::MeshGeometry::edges`].
    pub fn add_edge_scalar_quantity(
        &mut self,
        name: impl Into<String>,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&mut SurfaceEdgeScalarQuantity> {
        let base = self.new_scalar_base(name.into(), AttachmentKind::Edge, values, data_type)?;
        self.push_quantity(SurfaceEdgeScalarQuantity::new(base))
    }

    /// Adds a scalar quantity with one value per halfedge, in face order.
    pub fn add_halfedge_scalar_quantity(
        &mut self,
        name: impl Into<String>,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&mut SurfaceHalfedgeScalarQuantity> {
        let base = self.new_scalar_base(name.into(), AttachmentKind::Halfedge, values, data_type)?;
        self.push_quantity(SurfaceHalfedgeScalarQuantity::new(base))
    }

    /// Adds a scalar quantity with one value per corner, in face order.
    pub fn add_corner_scalar_quantity(
        &mut self,
        name: impl Into<String>,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&mut SurfaceCornerScalarQuantity> {
        let base = self.new_scalar_base(name.into(), AttachmentKind::Corner, values, data_type)?;
        self.push_quantity(SurfaceCornerScalarQuantity::new(base))
    }

    /// Adds a row-major `dim_x` x `dim_y` scalar image sampled through the
    /// parameterization named `param_name`, which must already exist.
    pub fn add_texture_scalar_quantity(
        &mut self,
        name: impl Into<String>,
        param_name: &str,
        dim_x: u32,
        dim_y: u32,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<&mut SurfaceTextureScalarQuantity> {
        let name = name.into();
        self.check_name(&name)?;
        if self.get_parameterization(param_name).is_none() {
            return Err(ScalarscopeError::MissingParameterization {
                quantity: name,
                parameterization: param_name.to_string(),
            });
        }
        if dim_x == 0 || dim_y == 0 {
            return Err(ScalarscopeError::EmptyImage(name, dim_x, dim_y));
        }
        let expected = dim_x as usize * dim_y as usize;
        if values.len() != expected {
            return Err(ScalarscopeError::DimensionMismatch {
                quantity: name,
                kind: AttachmentKind::Texture,
                expected,
                actual: values.len(),
            });
        }
        let quantity = SurfaceTextureScalarQuantity::new(
            name,
            self.name.clone(),
            param_name,
            (dim_x, dim_y),
            values,
            data_type,
            &self.options,
        );
        self.push_quantity(quantity)
    }

    /// Adds UV coordinates with one entry per vertex.
    pub fn add_vertex_parameterization_quantity(
        &mut self,
        name: impl Into<String>,
        coords: Vec<Vec2>,
    ) -> Result<&mut SurfaceParameterizationQuantity> {
        self.push_parameterization(name.into(), ParamDomain::Vertex, coords)
    }

    /// Adds UV coordinates with one entry per corner.
    pub fn add_corner_parameterization_quantity(
        &mut self,
        name: impl Into<String>,
        coords: Vec<Vec2>,
    ) -> Result<&mut SurfaceParameterizationQuantity> {
        self.push_parameterization(name.into(), ParamDomain::Corner, coords)
    }

    /// Replaces the coordinates of a parameterization. Texture quantities using it
    /// re-upload their texture coordinates on the next draw.
    pub fn update_parameterization(&mut self, name: &str, coords: Vec<Vec2>) -> Result<()> {
        let domain = self
            .get_parameterization(name)
            .map(SurfaceParameterizationQuantity::domain)
            .ok_or_else(|| ScalarscopeError::QuantityNotFound(name.to_string(), self.name.clone()))?;
        self.check_param_len(name, domain, coords.len())?;
        if let Some(param) = self.parameterizations.iter_mut().find(|p| p.name() == name) {
            param.set_coords(coords);
        }
        Ok(())
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if self.name_in_use(name) {
            return Err(ScalarscopeError::QuantityExists(name.to_string(), self.name.clone()));
        }
        Ok(())
    }

    fn check_param_len(&self, name: &str, domain: ParamDomain, actual: usize) -> Result<()> {
        let (kind, expected) = match domain {
            ParamDomain::Vertex => (AttachmentKind::Vertex, self.num_vertices()),
            ParamDomain::Corner => (AttachmentKind::Corner, self.num_corners()),
        };
        if actual != expected {
            return Err(ScalarscopeError::DimensionMismatch {
                quantity: name.to_string(),
                kind,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn new_scalar_base(
        &self,
        name: String,
        kind: AttachmentKind,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Result<SurfaceScalarQuantity> {
        self.check_name(&name)?;
        let expected = self.geometry.element_count(kind).unwrap_or(0);
        if values.len() != expected {
            return Err(ScalarscopeError::DimensionMismatch {
                quantity: name,
                kind,
                expected,
                actual: values.len(),
            });
        }
        Ok(SurfaceScalarQuantity::new(
            name,
            self.name.clone(),
            kind,
            values,
            data_type,
            &self.options,
        ))
    }

    fn push_quantity<T: SurfaceQuantity + 'static>(&mut self, quantity: T) -> Result<&mut T> {
        let name = quantity.name().to_string();
        log::debug!("added {} to mesh '{}'", quantity.display_name(), self.name);
        self.quantities.push(Box::new(quantity));
        let structure = self.name.clone();
        self.quantities
            .last_mut()
            .and_then(|q| q.as_any_mut().downcast_mut::<T>())
            .ok_or(ScalarscopeError::QuantityNotFound(name, structure))
    }

    fn push_parameterization(
        &mut self,
        name: String,
        domain: ParamDomain,
        coords: Vec<Vec2>,
    ) -> Result<&mut SurfaceParameterizationQuantity> {
        self.check_name(&name)?;
        self.check_param_len(&name, domain, coords.len())?;
        log::debug!("added {domain:?} parameterization '{name}' to mesh '{}'", self.name);
        let id = self.next_parameterization_id;
        self.next_parameterization_id += 1;
        self.parameterizations.push(SurfaceParameterizationQuantity::new(
            name.clone(),
            self.name.clone(),
            domain,
            coords,
            id,
        ));
        let structure = self.name.clone();
        self.parameterizations
            .last_mut()
            .ok_or(ScalarscopeError::QuantityNotFound(name, structure))
    }
}

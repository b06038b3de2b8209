//! Scalar quantities attached to mesh elements.
//!
//! The five element kinds share one base struct, [`SurfaceScalarQuantity`], and differ
//! only in how their values expand to rendered vertices and which shader variant
//! reads them. The mesh sees every quantity through the object-safe [`SurfaceQuantity`].

use glam::Mat4;
use scalarscope_core::{
    AttachmentKind, DataType, GpuState, MeshElement, Quantity, Result, ScalarMapping,
    ScalarOptions, ScalarscopeError,
};
use scalarscope_render::{
    BufferHandle, ColorMap, ColorMapRegistry, DrawCall, MeshGeometryBuffers, ProgramDesc,
    ProgramHandle, RenderBackend, ScalarShaderVariant, ScalarSource, ScalarUniforms,
};

use super::geometry::MeshGeometry;
use super::parameterization_quantity::SurfaceParameterizationQuantity;

/// How many times a quantity has built each of its GPU resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStats {
    pub program_builds: usize,
    pub buffer_builds: usize,
    pub texture_builds: usize,
}

/// Everything a quantity needs from its mesh and the renderer during a draw.
pub struct DrawContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    pub color_maps: &'a ColorMapRegistry,
    pub geometry: &'a MeshGeometry,
    pub geometry_buffers: &'a MeshGeometryBuffers,
    pub parameterizations: &'a [SurfaceParameterizationQuantity],
    pub model: Mat4,
}

/// The interface a [`super::SurfaceMesh`] uses for every scalar quantity it holds.
pub trait SurfaceQuantity: Quantity {
    /// Shared color-mapping state.
    fn scalar_mapping(&self) -> &ScalarMapping;

    /// Name shown in the UI, including the attachment kind.
    fn display_name(&self) -> String;

    /// Draws the quantity, building stale GPU resources first. Disabled quantities
    /// draw nothing.
    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> Result<()>;

    /// Builds the quantity's panel. Returns true if the quantity was switched on.
    fn build_ui(&mut self, ui: &mut egui::Ui, color_maps: &ColorMapRegistry) -> bool;

    /// Raw value at a picked element, if the element is of this quantity's kind.
    fn element_value(&self, element: MeshElement) -> Option<f32>;

    fn rebuild_stats(&self) -> RebuildStats;

    /// Frees GPU resources. They are rebuilt if the quantity is drawn again.
    fn release(&mut self, backend: &mut dyn RenderBackend);

    /// Shows [`SurfaceQuantity::element_value`] in an inspector row.
    fn build_element_info_ui(&self, ui: &mut egui::Ui, element: MeshElement) {
        if let Some(value) = self.element_value(element) {
            scalarscope_ui::build_element_info_ui(ui, &self.display_name(), element, Some(value));
        }
    }
}

/// State shared by every surface scalar quantity.
#[derive(Debug)]
pub struct SurfaceScalarQuantity {
    pub(crate) name: String,
    pub(crate) structure_name: String,
    pub(crate) kind: AttachmentKind,
    pub(crate) enabled: bool,
    pub(crate) mapping: ScalarMapping,
    program: Option<ProgramHandle>,
    program_state: GpuState,
    buffer: Option<BufferHandle>,
    buffer_state: GpuState,
    pub(crate) stats: RebuildStats,
}

impl SurfaceScalarQuantity {
    pub(crate) fn new(
        name: impl Into<String>,
        structure_name: impl Into<String>,
        kind: AttachmentKind,
        values: Vec<f32>,
        data_type: DataType,
        options: &ScalarOptions,
    ) -> Self {
        Self {
            name: name.into(),
            structure_name: structure_name.into(),
            kind,
            enabled: false,
            mapping: ScalarMapping::new(values, data_type, options),
            program: None,
            program_state: GpuState::Absent,
            buffer: None,
            buffer_state: GpuState::Absent,
            stats: RebuildStats::default(),
        }
    }

    pub fn program_state(&self) -> GpuState {
        self.program_state
    }

    /// State of the attribute buffer. Texture quantities use it for their texcoords.
    pub fn buffer_state(&self) -> GpuState {
        self.buffer_state
    }

    pub(crate) fn display_name(&self) -> String {
        format!("{} ({} scalar)", self.name, self.kind)
    }

    /// Value at `element`, if the element has this quantity's attachment kind.
    pub(crate) fn element_value(&self, element: MeshElement) -> Option<f32> {
        if element.kind() == self.kind {
            self.mapping.value(element.index())
        } else {
            None
        }
    }

    pub(crate) fn require_color_map<'r>(&self, color_maps: &'r ColorMapRegistry) -> Result<&'r ColorMap> {
        color_maps
            .get(self.mapping.color_map())
            .ok_or_else(|| ScalarscopeError::MissingColorMap(self.mapping.color_map().to_string()))
    }

    /// Returns the program, compiling it if stale.
    fn ensure_program(
        &mut self,
        backend: &mut dyn RenderBackend,
        variant: ScalarShaderVariant,
    ) -> Result<ProgramHandle> {
        if let (Some(program), false) = (self.program, self.program_state.needs_build()) {
            return Ok(program);
        }
        let label = format!("{} {}", self.structure_name, self.name);
        let program = backend.create_program(&ProgramDesc {
            label: &label,
            variant,
            color_map: self.mapping.color_map(),
        })?;
        if let Some(old) = self.program.replace(program) {
            backend.release_program(old);
        }
        self.program_state = GpuState::Ready;
        self.stats.program_builds += 1;
        log::debug!("built {} program for '{}'", variant.label(), self.name);
        Ok(program)
    }

    /// Returns the attribute buffer if it is current.
    pub(crate) fn current_buffer(&self) -> Option<BufferHandle> {
        self.buffer.filter(|_| !self.buffer_state.needs_build())
    }

    /// Uploads `data` as the attribute buffer, replacing the old one.
    pub(crate) fn upload_buffer(
        &mut self,
        backend: &mut dyn RenderBackend,
        variant: ScalarShaderVariant,
        data: &[f32],
    ) -> Result<BufferHandle> {
        let buffer = backend.create_attribute_buffer(&self.name, variant.attribute_layout(), data)?;
        if let Some(old) = self.buffer.replace(buffer) {
            backend.release_buffer(old);
        }
        self.buffer_state = GpuState::Ready;
        self.stats.buffer_builds += 1;
        log::debug!("uploaded {} floats for '{}'", data.len(), self.name);
        Ok(buffer)
    }

    /// Draws with an already prepared value source. Fails before touching the GPU
    /// if the colormap is not registered.
    pub(crate) fn draw_with_source(
        &mut self,
        ctx: &mut DrawContext<'_>,
        variant: ScalarShaderVariant,
        source: ScalarSource,
        uniforms: ScalarUniforms,
    ) -> Result<()> {
        let color_map = self.require_color_map(ctx.color_maps)?;
        let color_map_texture = ctx.backend.color_map_texture(color_map)?;
        let program = self.ensure_program(ctx.backend, variant)?;
        ctx.backend.draw(&DrawCall {
            program,
            geometry: ctx.geometry_buffers,
            source,
            color_map: color_map_texture,
            uniforms,
            model: ctx.model,
        })?;
        Ok(())
    }

    /// Draws an element-attached quantity whose values expand to `variant`'s layout.
    pub(crate) fn draw_attribute(
        &mut self,
        ctx: &mut DrawContext<'_>,
        variant: ScalarShaderVariant,
        expand: fn(&MeshGeometry, &[f32]) -> Vec<f32>,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.require_color_map(ctx.color_maps)?;
        let buffer = match self.current_buffer() {
            Some(buffer) => buffer,
            None => {
                let data = expand(ctx.geometry, self.mapping.values());
                self.upload_buffer(ctx.backend, variant, &data)?
            }
        };
        let uniforms = ScalarUniforms::from_mapping(&self.mapping);
        self.draw_with_source(ctx, variant, ScalarSource::Attribute(buffer), uniforms)
    }

    pub(crate) fn invalidate_program(&mut self) {
        self.program_state.invalidate();
    }

    pub(crate) fn invalidate_buffer(&mut self) {
        self.buffer_state.invalidate();
    }

    pub(crate) fn release(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(program) = self.program.take() {
            backend.release_program(program);
        }
        if let Some(buffer) = self.buffer.take() {
            backend.release_buffer(buffer);
        }
        self.program_state = GpuState::Absent;
        self.buffer_state = GpuState::Absent;
    }

    /// Builds the shared scalar panel, invalidating the program if needed.
    /// Returns true if the quantity was switched on.
    pub(crate) fn build_ui(&mut self, ui: &mut egui::Ui, color_maps: &ColorMapRegistry) -> bool {
        let label = self.display_name();
        let changes = scalarscope_ui::build_scalar_quantity_ui(
            ui,
            &label,
            &mut self.enabled,
            &mut self.mapping,
            color_maps,
        );
        if changes.program_stale() {
            self.program_state.invalidate();
        }
        changes.enabled && self.enabled
    }
}

/// Implements `Quantity` and `ScalarQuantity` for a type wrapping a
/// `SurfaceScalarQuantity` in a `base` field. `$values` invalidates uploaded values.
macro_rules! impl_scalar_quantity {
    ($ty:ty, $values:ident) => {
        impl scalarscope_core::Quantity for $ty {
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }

            fn name(&self) -> &str {
                &self.base.name
            }

            fn structure_name(&self) -> &str {
                &self.base.structure_name
            }

            fn kind(&self) -> scalarscope_core::QuantityKind {
                scalarscope_core::QuantityKind::Scalar
            }

            fn is_enabled(&self) -> bool {
                self.base.enabled
            }

            fn set_enabled(&mut self, enabled: bool) {
                self.base.enabled = enabled;
            }

            fn refresh(&mut self) {
                self.base.invalidate_program();
                self.base.invalidate_buffer();
                self.$values();
            }

            fn data_size(&self) -> usize {
                self.base.mapping.len()
            }
        }

        impl scalarscope_core::ScalarQuantity for $ty {
            fn mapping(&self) -> &scalarscope_core::ScalarMapping {
                &self.base.mapping
            }

            fn mapping_mut(&mut self) -> &mut scalarscope_core::ScalarMapping {
                &mut self.base.mapping
            }

            fn attachment_kind(&self) -> scalarscope_core::AttachmentKind {
                self.base.kind
            }

            fn invalidate_program(&mut self) {
                self.base.invalidate_program();
            }

            fn invalidate_values(&mut self) {
                self.$values();
            }
        }
    };
}

pub(crate) use impl_scalar_quantity;

macro_rules! element_scalar_quantity {
    ($(#[$meta:meta])* $name:ident, $shader:expr, $expand:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name {
            base: SurfaceScalarQuantity,
        }

        impl $name {
            pub(crate) fn new(base: SurfaceScalarQuantity) -> Self {
                Self { base }
            }

            pub fn values(&self) -> &[f32] {
                self.base.mapping.values()
            }

            pub fn base(&self) -> &SurfaceScalarQuantity {
                &self.base
            }

            fn invalidate_buffer(&mut self) {
                self.base.invalidate_buffer();
            }
        }

        impl_scalar_quantity!($name, invalidate_buffer);

        impl SurfaceQuantity for $name {
            fn scalar_mapping(&self) -> &ScalarMapping {
                &self.base.mapping
            }

            fn display_name(&self) -> String {
                self.base.display_name()
            }

            fn draw(&mut self, ctx: &mut DrawContext<'_>) -> Result<()> {
                self.base.draw_attribute(ctx, $shader, MeshGeometry::$expand)
            }

            fn build_ui(&mut self, ui: &mut egui::Ui, color_maps: &ColorMapRegistry) -> bool {
                self.base.build_ui(ui, color_maps)
            }

            fn element_value(&self, element: MeshElement) -> Option<f32> {
                self.base.element_value(element)
            }

            fn rebuild_stats(&self) -> RebuildStats {
                self.base.stats
            }

            fn release(&mut self, backend: &mut dyn RenderBackend) {
                self.base.release(backend);
            }
        }
    };
}

element_scalar_quantity!(
    /// Values per vertex, interpolated across faces.
    SurfaceVertexScalarQuantity,
    ScalarShaderVariant::VertexInterpolated,
    expand_vertex_values
);
element_scalar_quantity!(
    /// Values per face, drawn flat.
    SurfaceFaceScalarQuantity,
    ScalarShaderVariant::FaceFlat,
    expand_face_values
);
element_scalar_quantity!(
    /// Values per unique edge, in sorted-edge order.
    SurfaceEdgeScalarQuantity,
    ScalarShaderVariant::EdgeNearest,
    expand_edge_values
);
element_scalar_quantity!(
    /// Values per halfedge, in face order.
    SurfaceHalfedgeScalarQuantity,
    ScalarShaderVariant::EdgeNearest,
    expand_halfedge_values
);
element_scalar_quantity!(
    /// Values per corner, in face order.
    SurfaceCornerScalarQuantity,
    ScalarShaderVariant::CornerNearest,
    expand_corner_values
);

//! Scalar images sampled through a UV parameterization.

use scalarscope_core::{
    AttachmentKind, DataType, GpuState, ImageOrigin, MeshElement, Result, ScalarMapping,
    ScalarOptions, ScalarscopeError,
};
use scalarscope_render::{
    ColorMapRegistry, RenderBackend, ScalarShaderVariant, ScalarSource, ScalarUniforms,
    TextureFilter, TextureHandle,
};

use super::scalar_quantity::{
    impl_scalar_quantity, DrawContext, RebuildStats, SurfaceQuantity, SurfaceScalarQuantity,
};

/// A `dim_x` x `dim_y` scalar image drawn on the mesh through a parameterization.
///
/// The parameterization is referenced by name and looked up on every draw; drawing
/// after it was removed fails with [`ScalarscopeError::MissingParameterization`].
#[derive(Debug)]
pub struct SurfaceTextureScalarQuantity {
    base: SurfaceScalarQuantity,
    param_name: String,
    dim_x: u32,
    dim_y: u32,
    origin: ImageOrigin,
    filter: TextureFilter,
    texture: Option<TextureHandle>,
    texture_state: GpuState,
    /// Parameterization `(id, revision)` the texcoord buffer was built from.
    param_version: Option<(u64, u64)>,
}

impl SurfaceTextureScalarQuantity {
    pub(crate) fn new(
        name: impl Into<String>,
        structure_name: impl Into<String>,
        param_name: impl Into<String>,
        (dim_x, dim_y): (u32, u32),
        values: Vec<f32>,
        data_type: DataType,
        options: &ScalarOptions,
    ) -> Self {
        Self {
            base: SurfaceScalarQuantity::new(
                name,
                structure_name,
                AttachmentKind::Texture,
                values,
                data_type,
                options,
            ),
            param_name: param_name.into(),
            dim_x,
            dim_y,
            origin: ImageOrigin::default(),
            filter: TextureFilter::default(),
            texture: None,
            texture_state: GpuState::Absent,
            param_version: None,
        }
    }

    pub fn base(&self) -> &SurfaceScalarQuantity {
        &self.base
    }

    /// Name of the parameterization the image is sampled through.
    pub fn parameterization_name(&self) -> &str {
        &self.param_name
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.dim_x, self.dim_y)
    }

    pub fn values(&self) -> &[f32] {
        self.base.mapping.values()
    }

    pub fn texture_state(&self) -> GpuState {
        self.texture_state
    }

    pub fn image_origin(&self) -> ImageOrigin {
        self.origin
    }

    /// Sets which image row is the top. Re-uploads the image on the next draw.
    pub fn set_image_origin(&mut self, origin: ImageOrigin) -> &mut Self {
        if self.origin != origin {
            self.origin = origin;
            self.texture_state.invalidate();
        }
        self
    }

    pub fn filter(&self) -> TextureFilter {
        self.filter
    }

    /// Sets the sampling filter. Takes effect on the next draw without re-uploading.
    pub fn set_filter(&mut self, filter: TextureFilter) -> &mut Self {
        self.filter = filter;
        self
    }

    /// Raw value at texel `(x, y)`, with `y` counted in the image's own row order.
    pub fn value_at_texel(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.dim_x || y >= self.dim_y {
            return None;
        }
        self.base
            .mapping
            .value(y as usize * self.dim_x as usize + x as usize)
    }

    /// Image rows ordered so row 0 lands at `v = 0`.
    fn texel_rows(&self) -> Vec<f32> {
        let values = self.values();
        match self.origin {
            ImageOrigin::LowerLeft => values.to_vec(),
            ImageOrigin::UpperLeft => values
                .chunks_exact(self.dim_x.max(1) as usize)
                .rev()
                .flatten()
                .copied()
                .collect(),
        }
    }

    fn invalidate_texture(&mut self) {
        self.texture_state.invalidate();
    }

    fn ensure_texture(&mut self, backend: &mut dyn RenderBackend) -> Result<TextureHandle> {
        if let (Some(texture), false) = (self.texture, self.texture_state.needs_build()) {
            return Ok(texture);
        }
        let data = self.texel_rows();
        let texture = backend.create_scalar_texture(&self.base.name, self.dim_x, self.dim_y, &data)?;
        if let Some(old) = self.texture.replace(texture) {
            backend.release_texture(old);
        }
        self.texture_state = GpuState::Ready;
        self.base.stats.texture_builds += 1;
        log::debug!(
            "uploaded {}x{} texture for '{}'",
            self.dim_x,
            self.dim_y,
            self.base.name
        );
        Ok(texture)
    }
}

impl_scalar_quantity!(SurfaceTextureScalarQuantity, invalidate_texture);

impl SurfaceQuantity for SurfaceTextureScalarQuantity {
    fn scalar_mapping(&self) -> &ScalarMapping {
        &self.base.mapping
    }

    fn display_name(&self) -> String {
        self.base.display_name()
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) -> Result<()> {
        if !self.base.enabled {
            return Ok(());
        }
        let parameterizations = ctx.parameterizations;
        let param = parameterizations
            .iter()
            .find(|p| scalarscope_core::Quantity::name(*p) == self.param_name)
            .ok_or_else(|| ScalarscopeError::MissingParameterization {
                quantity: self.base.name.clone(),
                parameterization: self.param_name.clone(),
            })?;
        self.base.require_color_map(ctx.color_maps)?;

        if self.param_version != Some(param.version()) {
            self.base.invalidate_buffer();
        }
        let texcoords = match self.base.current_buffer() {
            Some(buffer) => buffer,
            None => {
                let data = param.texcoords(ctx.geometry);
                let buffer = self
                    .base
                    .upload_buffer(ctx.backend, ScalarShaderVariant::Texture, &data)?;
                self.param_version = Some(param.version());
                buffer
            }
        };
        let texture = self.ensure_texture(ctx.backend)?;

        let uniforms = ScalarUniforms::from_mapping(&self.base.mapping).with_texture_filter(self.filter);
        self.base.draw_with_source(
            ctx,
            ScalarShaderVariant::Texture,
            ScalarSource::Texture { texture, texcoords },
            uniforms,
        )
    }

    fn build_ui(&mut self, ui: &mut egui::Ui, color_maps: &ColorMapRegistry) -> bool {
        let switched_on = self.base.build_ui(ui, color_maps);
        if self.base.enabled {
            let mut origin = self.origin;
            let mut filter = self.filter;
            let id_salt = format!("{} texture", self.base.name);
            if scalarscope_ui::build_texture_options_ui(ui, &id_salt, &mut origin, &mut filter) {
                self.set_image_origin(origin);
                self.set_filter(filter);
            }
        }
        switched_on
    }

    /// Texel values are not attached to mesh elements.
    fn element_value(&self, _element: MeshElement) -> Option<f32> {
        None
    }

    fn rebuild_stats(&self) -> RebuildStats {
        self.base.stats
    }

    fn release(&mut self, backend: &mut dyn RenderBackend) {
        self.base.release(backend);
        if let Some(texture) = self.texture.take() {
            backend.release_texture(texture);
        }
        self.texture_state = GpuState::Absent;
        self.param_version = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(origin: ImageOrigin) -> SurfaceTextureScalarQuantity {
        // 3 wide, 2 tall; row 0 is [0, 1, 2]
        let mut q = SurfaceTextureScalarQuantity::new(
            "img",
            "mesh",
            "uv",
            (3, 2),
            vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0],
            DataType::Standard,
            &ScalarOptions::default(),
        );
        q.set_image_origin(origin);
        q
    }

    #[test]
    fn test_upper_left_rows_are_flipped() {
        let q = image(ImageOrigin::UpperLeft);
        assert_eq!(q.texel_rows(), vec![10.0, 11.0, 12.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_lower_left_rows_are_kept() {
        let q = image(ImageOrigin::LowerLeft);
        assert_eq!(q.texel_rows(), vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_value_at_texel() {
        let q = image(ImageOrigin::UpperLeft);
        assert_eq!(q.value_at_texel(2, 1), Some(12.0));
        assert_eq!(q.value_at_texel(0, 0), Some(0.0));
        assert_eq!(q.value_at_texel(3, 0), None);
        assert_eq!(q.value_at_texel(0, 2), None);
    }

    #[test]
    fn test_nice_name_and_kind() {
        use scalarscope_core::ScalarQuantity;
        let q = image(ImageOrigin::UpperLeft);
        assert_eq!(q.nice_name(), "img (texture scalar)");
        assert_eq!(q.attachment_kind(), AttachmentKind::Texture);
        assert_eq!(q.element_value(MeshElement::Vertex(0)), None);
    }
}

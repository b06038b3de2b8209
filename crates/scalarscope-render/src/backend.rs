//! The rendering-engine interface used by quantities.
//!
//! Quantities never touch wgpu directly. They create programs, attribute buffers and
//! textures through a [`RenderBackend`] and hold the returned handles, which lets the
//! same quantity code drive a real GPU or a recording backend in tests.

use glam::Mat4;

use crate::color_maps::ColorMap;
use crate::error::RenderResult;
use crate::scalar_render::ScalarUniforms;
use crate::shader::ScalarShaderVariant;

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            pub fn from_raw(id: u64) -> Self {
                Self(id)
            }

            pub fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

handle_type!(
    /// A compiled scalar shader program.
    ProgramHandle
);
handle_type!(
    /// A per-rendered-vertex attribute buffer.
    BufferHandle
);
handle_type!(
    /// A texture: color map lookup table or 2D scalar field.
    TextureHandle
);

/// Shape of one attribute entry, per rendered vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeLayout {
    /// One float.
    Scalar,
    /// Three floats, padded to four.
    Triple,
    /// A 2D texture coordinate.
    TexCoord,
}

impl AttributeLayout {
    /// Floats per rendered vertex as stored in the buffer.
    pub fn components(self) -> usize {
        match self {
            AttributeLayout::Scalar => 1,
            AttributeLayout::Triple => 4,
            AttributeLayout::TexCoord => 2,
        }
    }
}

/// Sampling mode for scalar textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    #[default]
    Linear,
    Nearest,
}

impl TextureFilter {
    pub fn shader_tag(self) -> u32 {
        match self {
            TextureFilter::Linear => 0,
            TextureFilter::Nearest => 1,
        }
    }
}

/// What a program is built from.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub variant: ScalarShaderVariant,
    pub color_map: &'a str,
}

/// Geometry buffers shared by every quantity of a mesh, one entry per rendered vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshGeometryBuffers {
    pub positions: BufferHandle,
    pub normals: BufferHandle,
    pub barycentrics: BufferHandle,
    /// Per-triangle flags marking which of its edges are original polygon edges.
    pub edge_is_real: BufferHandle,
    pub vertex_count: u32,
}

/// Where the fragment shader reads scalar values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarSource {
    Attribute(BufferHandle),
    Texture {
        texture: TextureHandle,
        texcoords: BufferHandle,
    },
}

/// One draw of a scalar quantity.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub program: ProgramHandle,
    pub geometry: &'a MeshGeometryBuffers,
    pub source: ScalarSource,
    pub color_map: TextureHandle,
    pub uniforms: ScalarUniforms,
    pub model: Mat4,
}

/// A rendering engine able to draw scalar quantities.
pub trait RenderBackend {
    /// Compiles (or fetches) the program for a shader variant.
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramHandle>;

    /// Uploads per-rendered-vertex data. `data.len()` must be a multiple of
    /// `layout.components()`.
    fn create_attribute_buffer(
        &mut self,
        label: &str,
        layout: AttributeLayout,
        data: &[f32],
    ) -> RenderResult<BufferHandle>;

    /// Uploads a row-major single-channel float texture. Row 0 is sampled at `v = 0`.
    fn create_scalar_texture(
        &mut self,
        label: &str,
        dim_x: u32,
        dim_y: u32,
        data: &[f32],
    ) -> RenderResult<TextureHandle>;

    /// Returns the lookup texture for a color map, uploading it on first use.
    /// Textures are shared by every quantity using the same map.
    fn color_map_texture(&mut self, color_map: &ColorMap) -> RenderResult<TextureHandle>;

    fn release_program(&mut self, program: ProgramHandle);

    fn release_buffer(&mut self, buffer: BufferHandle);

    fn release_texture(&mut self, texture: TextureHandle);

    fn draw(&mut self, call: &DrawCall<'_>) -> RenderResult<()>;
}

/// Checks that `data` holds whole entries of `layout`.
pub(crate) fn validate_attribute(layout: AttributeLayout, data: &[f32]) -> RenderResult<()> {
    if data.len() % layout.components() == 0 {
        Ok(())
    } else {
        Err(crate::error::RenderError::InvalidData(format!(
            "attribute of {} floats is not a multiple of {:?} ({} components)",
            data.len(),
            layout,
            layout.components()
        )))
    }
}

/// Checks that a scalar texture's data matches its dimensions and that neither
/// dimension exceeds `max_dimension`.
pub(crate) fn validate_texture(
    dim_x: u32,
    dim_y: u32,
    data: &[f32],
    max_dimension: u32,
) -> RenderResult<()> {
    let expected = dim_x as usize * dim_y as usize;
    if dim_x == 0 || dim_y == 0 || data.len() != expected {
        return Err(crate::error::RenderError::InvalidData(format!(
            "texture {dim_x}x{dim_y} needs {expected} values, got {}",
            data.len()
        )));
    }
    if dim_x > max_dimension || dim_y > max_dimension {
        return Err(crate::error::RenderError::InvalidData(format!(
            "texture {dim_x}x{dim_y} exceeds the device limit of {max_dimension}"
        )));
    }
    Ok(())
}

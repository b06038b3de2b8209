//! Shader assembly for the surface scalar variants.

use crate::backend::AttributeLayout;
use crate::error::{RenderError, RenderResult};

const SCALAR_COMMON: &str = include_str!("shaders/scalar_common.wgsl");
const SCALAR_VERTEX: &str = include_str!("shaders/scalar_vertex.wgsl");
const SCALAR_CORNER: &str = include_str!("shaders/scalar_corner.wgsl");
const SCALAR_EDGE: &str = include_str!("shaders/scalar_edge.wgsl");
const SCALAR_TEXTURE: &str = include_str!("shaders/scalar_texture.wgsl");

/// The shader programs scalar quantities are drawn with.
///
/// Programs are keyed by variant only; the color map is a bound texture, so
/// quantities that differ only in color map share a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarShaderVariant {
    /// Per-vertex values interpolated across each triangle.
    VertexInterpolated,
    /// One value per face, flat.
    FaceFlat,
    /// Per-corner values, nearest corner wins.
    CornerNearest,
    /// Per-edge values, nearest real edge wins. Used for edge and halfedge data.
    EdgeNearest,
    /// Values sampled from a texture through texture coordinates.
    Texture,
}

impl ScalarShaderVariant {
    pub const ALL: [ScalarShaderVariant; 5] = [
        ScalarShaderVariant::VertexInterpolated,
        ScalarShaderVariant::FaceFlat,
        ScalarShaderVariant::CornerNearest,
        ScalarShaderVariant::EdgeNearest,
        ScalarShaderVariant::Texture,
    ];

    /// Layout of the attribute buffer bound at group 1, binding 4.
    pub fn attribute_layout(self) -> AttributeLayout {
        match self {
            ScalarShaderVariant::VertexInterpolated | ScalarShaderVariant::FaceFlat => {
                AttributeLayout::Scalar
            }
            ScalarShaderVariant::CornerNearest | ScalarShaderVariant::EdgeNearest => {
                AttributeLayout::Triple
            }
            ScalarShaderVariant::Texture => AttributeLayout::TexCoord,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScalarShaderVariant::VertexInterpolated => "scalar vertex",
            ScalarShaderVariant::FaceFlat => "scalar face",
            ScalarShaderVariant::CornerNearest => "scalar corner",
            ScalarShaderVariant::EdgeNearest => "scalar edge",
            ScalarShaderVariant::Texture => "scalar texture",
        }
    }

    fn body(self) -> &'static str {
        match self {
            ScalarShaderVariant::VertexInterpolated | ScalarShaderVariant::FaceFlat => {
                SCALAR_VERTEX
            }
            ScalarShaderVariant::CornerNearest => SCALAR_CORNER,
            ScalarShaderVariant::EdgeNearest => SCALAR_EDGE,
            ScalarShaderVariant::Texture => SCALAR_TEXTURE,
        }
    }

    /// A builder preloaded with this variant's sources.
    pub fn builder(self) -> ShaderBuilder {
        ShaderBuilder::new()
            .with_label(self.label())
            .with_part(SCALAR_COMMON)
            .with_part(self.body())
    }
}

/// Composes WGSL source from parts and builds shader modules.
pub struct ShaderBuilder {
    parts: Vec<String>,
    vertex_entry: String,
    fragment_entry: String,
    label: Option<String>,
}

impl ShaderBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parts: Vec::new(),
            vertex_entry: "vs_main".to_string(),
            fragment_entry: "fs_main".to_string(),
            label: None,
        }
    }

    /// Appends a WGSL snippet. Parts are concatenated in order.
    #[must_use]
    pub fn with_part(mut self, source: impl Into<String>) -> Self {
        self.parts.push(source.into());
        self
    }

    #[must_use]
    pub fn with_vertex_entry(mut self, entry: impl Into<String>) -> Self {
        self.vertex_entry = entry.into();
        self
    }

    #[must_use]
    pub fn with_fragment_entry(mut self, entry: impl Into<String>) -> Self {
        self.fragment_entry = entry.into();
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// Returns the combined source, checking that both entry points are present.
    pub fn source(&self) -> RenderResult<String> {
        if self.parts.is_empty() {
            return Err(RenderError::ShaderCompilationFailed(
                "no shader source".into(),
            ));
        }
        let source = self.parts.join("\n");
        for (stage, entry) in [("vertex", &self.vertex_entry), ("fragment", &self.fragment_entry)] {
            if !source.contains(&format!("fn {entry}(")) {
                return Err(RenderError::ShaderCompilationFailed(format!(
                    "missing {stage} entry point '{entry}'"
                )));
            }
        }
        Ok(source)
    }

    /// Builds the shader module (does not create a pipeline).
    pub fn build_module(&self, device: &wgpu::Device) -> RenderResult<wgpu::ShaderModule> {
        let source = self.source()?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: self.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        }))
    }
}

impl Default for ShaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

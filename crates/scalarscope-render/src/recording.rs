//! A headless backend that records what it is asked to do.
//!
//! Useful for tests and for running the quantity pipeline without a GPU: every
//! resource is kept on the CPU and every call is counted.

use std::collections::HashMap;

use crate::backend::{
    validate_attribute, validate_texture, AttributeLayout, BufferHandle, DrawCall, ProgramDesc,
    ProgramHandle, RenderBackend, ScalarSource, TextureHandle,
};
use crate::color_maps::{ColorMap, COLORMAP_RESOLUTION};
use crate::error::{RenderError, RenderResult};
use crate::scalar_render::ScalarUniforms;
use crate::shader::ScalarShaderVariant;

/// Most recent draws kept by [`RecordingBackend::draws`]; older ones are dropped.
/// `BackendStats::draw_calls` still counts every draw.
pub const MAX_RECORDED_DRAWS: usize = 1024;

/// Running totals of backend calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub programs_created: usize,
    pub buffers_created: usize,
    pub textures_created: usize,
    pub color_maps_uploaded: usize,
    pub programs_released: usize,
    pub buffers_released: usize,
    pub textures_released: usize,
    pub draw_calls: usize,
}

/// A draw as seen by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub program: ProgramHandle,
    pub variant: ScalarShaderVariant,
    pub color_map: String,
    pub vertex_count: u32,
    pub source: ScalarSource,
    pub uniforms: ScalarUniforms,
}

#[derive(Debug, Clone)]
struct RecordedProgram {
    variant: ScalarShaderVariant,
    color_map: String,
}

#[derive(Debug, Clone)]
struct RecordedBuffer {
    layout: AttributeLayout,
    data: Vec<f32>,
}

#[derive(Debug, Clone)]
struct RecordedTexture {
    dims: (u32, u32),
    data: Vec<f32>,
}

/// In-memory [`RenderBackend`].
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    stats: BackendStats,
    programs: HashMap<u64, RecordedProgram>,
    buffers: HashMap<u64, RecordedBuffer>,
    textures: HashMap<u64, RecordedTexture>,
    color_maps: HashMap<String, TextureHandle>,
    draws: Vec<RecordedDraw>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    /// The last [`MAX_RECORDED_DRAWS`] draws issued since creation or the last
    /// [`RecordingBackend::clear_draws`], oldest first.
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn last_draw(&self) -> Option<&RecordedDraw> {
        self.draws.last()
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    /// Contents of a live attribute buffer.
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[f32]> {
        self.buffers.get(&buffer.raw()).map(|b| b.data.as_slice())
    }

    pub fn buffer_layout(&self, buffer: BufferHandle) -> Option<AttributeLayout> {
        self.buffers.get(&buffer.raw()).map(|b| b.layout)
    }

    /// Dimensions and contents of a live scalar texture.
    pub fn texture_data(&self, texture: TextureHandle) -> Option<((u32, u32), &[f32])> {
        self.textures
            .get(&texture.raw())
            .map(|t| (t.dims, t.data.as_slice()))
    }

    pub fn program_variant(&self, program: ProgramHandle) -> Option<ScalarShaderVariant> {
        self.programs.get(&program.raw()).map(|p| p.variant)
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramHandle> {
        desc.variant.builder().source()?;
        let id = self.next_id();
        self.programs.insert(
            id,
            RecordedProgram {
                variant: desc.variant,
                color_map: desc.color_map.to_string(),
            },
        );
        self.stats.programs_created += 1;
        log::trace!("recorded program '{}' ({:?})", desc.label, desc.variant);
        Ok(ProgramHandle::from_raw(id))
    }

    fn create_attribute_buffer(
        &mut self,
        label: &str,
        layout: AttributeLayout,
        data: &[f32],
    ) -> RenderResult<BufferHandle> {
        validate_attribute(layout, data)?;
        let id = self.next_id();
        self.buffers.insert(
            id,
            RecordedBuffer {
                layout,
                data: data.to_vec(),
            },
        );
        self.stats.buffers_created += 1;
        log::trace!("recorded buffer '{label}' with {} floats", data.len());
        Ok(BufferHandle::from_raw(id))
    }

    fn create_scalar_texture(
        &mut self,
        label: &str,
        dim_x: u32,
        dim_y: u32,
        data: &[f32],
    ) -> RenderResult<TextureHandle> {
        validate_texture(
            dim_x,
            dim_y,
            data,
            wgpu::Limits::default().max_texture_dimension_2d,
        )?;
        let id = self.next_id();
        self.textures.insert(
            id,
            RecordedTexture {
                dims: (dim_x, dim_y),
                data: data.to_vec(),
            },
        );
        self.stats.textures_created += 1;
        log::trace!("recorded texture '{label}' {dim_x}x{dim_y}");
        Ok(TextureHandle::from_raw(id))
    }

    fn color_map_texture(&mut self, color_map: &ColorMap) -> RenderResult<TextureHandle> {
        if let Some(&handle) = self.color_maps.get(&color_map.name) {
            return Ok(handle);
        }
        let lut = color_map.lut_rgba8(COLORMAP_RESOLUTION);
        let data: Vec<f32> = lut.iter().map(|&c| f32::from(c) / 255.0).collect();
        let id = self.next_id();
        self.textures.insert(
            id,
            RecordedTexture {
                dims: (COLORMAP_RESOLUTION * 4, 1),
                data,
            },
        );
        let handle = TextureHandle::from_raw(id);
        self.color_maps.insert(color_map.name.clone(), handle);
        self.stats.color_maps_uploaded += 1;
        Ok(handle)
    }

    fn release_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program.raw()).is_some() {
            self.stats.programs_released += 1;
        }
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer.raw()).is_some() {
            self.stats.buffers_released += 1;
        }
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture.raw()).is_some() {
            self.stats.textures_released += 1;
        }
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> RenderResult<()> {
        let program = self
            .programs
            .get(&call.program.raw())
            .ok_or(RenderError::InvalidHandle("program"))?
            .clone();

        let geometry = call.geometry;
        for buffer in [
            geometry.positions,
            geometry.normals,
            geometry.barycentrics,
            geometry.edge_is_real,
        ] {
            if !self.buffers.contains_key(&buffer.raw()) {
                return Err(RenderError::InvalidHandle("geometry buffer"));
            }
        }

        let (values, texture) = match call.source {
            ScalarSource::Attribute(buffer) => (buffer, None),
            ScalarSource::Texture { texture, texcoords } => (texcoords, Some(texture)),
        };
        let value_buffer = self
            .buffers
            .get(&values.raw())
            .ok_or(RenderError::InvalidHandle("value buffer"))?;
        if value_buffer.layout != program.variant.attribute_layout() {
            return Err(RenderError::InvalidData(format!(
                "{:?} program cannot read a {:?} buffer",
                program.variant, value_buffer.layout
            )));
        }
        let entries = value_buffer.data.len() / value_buffer.layout.components();
        if entries != geometry.vertex_count as usize {
            return Err(RenderError::InvalidData(format!(
                "value buffer has {entries} entries for {} rendered vertices",
                geometry.vertex_count
            )));
        }
        if let Some(texture) = texture {
            if !self.textures.contains_key(&texture.raw()) {
                return Err(RenderError::InvalidHandle("scalar texture"));
            }
        }
        if !self.textures.contains_key(&call.color_map.raw()) {
            return Err(RenderError::InvalidHandle("color map texture"));
        }

        self.stats.draw_calls += 1;
        if self.draws.len() >= MAX_RECORDED_DRAWS {
            let excess = self.draws.len() + 1 - MAX_RECORDED_DRAWS;
            self.draws.drain(..excess);
        }
        self.draws.push(RecordedDraw {
            program: call.program,
            variant: program.variant,
            color_map: program.color_map,
            vertex_count: geometry.vertex_count,
            source: call.source,
            uniforms: call.uniforms,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MeshGeometryBuffers;
    use crate::color_maps::ColorMapRegistry;
    use glam::Mat4;

    fn geometry(backend: &mut RecordingBackend, vertex_count: u32) -> MeshGeometryBuffers {
        let quad = vec![0.0; vertex_count as usize * 4];
        let mut make = |label| {
            backend
                .create_attribute_buffer(label, AttributeLayout::Triple, &quad)
                .unwrap()
        };
        MeshGeometryBuffers {
            positions: make("positions"),
            normals: make("normals"),
            barycentrics: make("barycentrics"),
            edge_is_real: make("edge_is_real"),
            vertex_count,
        }
    }

    #[test]
    fn test_color_map_texture_is_shared() {
        let registry = ColorMapRegistry::new();
        let mut backend = RecordingBackend::new();
        let viridis = registry.get("viridis").unwrap();
        let a = backend.color_map_texture(viridis).unwrap();
        let b = backend.color_map_texture(viridis).unwrap();
        assert_eq!(a, b);
        assert_eq!(backend.stats().color_maps_uploaded, 1);
    }

    #[test]
    fn test_attribute_must_be_whole_entries() {
        let mut backend = RecordingBackend::new();
        let result = backend.create_attribute_buffer("bad", AttributeLayout::TexCoord, &[1.0; 3]);
        assert!(matches!(result, Err(RenderError::InvalidData(_))));
    }

    #[test]
    fn test_draw_checks_layout_and_count() {
        let registry = ColorMapRegistry::new();
        let mut backend = RecordingBackend::new();
        let geometry = geometry(&mut backend, 3);
        let program = backend
            .create_program(&ProgramDesc {
                label: "test",
                variant: ScalarShaderVariant::VertexInterpolated,
                color_map: "viridis",
            })
            .unwrap();
        let color_map = backend
            .color_map_texture(registry.get("viridis").unwrap())
            .unwrap();
        let uniforms: ScalarUniforms = bytemuck::Zeroable::zeroed();

        let good = backend
            .create_attribute_buffer("values", AttributeLayout::Scalar, &[1.0, 2.0, 3.0])
            .unwrap();
        let short = backend
            .create_attribute_buffer("values", AttributeLayout::Scalar, &[1.0, 2.0])
            .unwrap();

        let mut call = DrawCall {
            program,
            geometry: &geometry,
            source: ScalarSource::Attribute(good),
            color_map,
            uniforms,
            model: Mat4::IDENTITY,
        };
        backend.draw(&call).unwrap();
        assert_eq!(backend.last_draw().unwrap().color_map, "viridis");

        call.source = ScalarSource::Attribute(short);
        assert!(backend.draw(&call).is_err());

        call.source = ScalarSource::Attribute(geometry.positions);
        assert!(backend.draw(&call).is_err());
        assert_eq!(backend.stats().draw_calls, 1);
    }

    #[test]
    fn test_draw_log_keeps_most_recent() {
        let registry = ColorMapRegistry::new();
        let mut backend = RecordingBackend::new();
        let geometry = geometry(&mut backend, 3);
        let program = backend
            .create_program(&ProgramDesc {
                label: "test",
                variant: ScalarShaderVariant::FaceFlat,
                color_map: "reds",
            })
            .unwrap();
        let color_map = backend
            .color_map_texture(registry.get("reds").unwrap())
            .unwrap();
        let values = backend
            .create_attribute_buffer("values", AttributeLayout::Scalar, &[1.0, 2.0, 3.0])
            .unwrap();

        let mut uniforms: ScalarUniforms = bytemuck::Zeroable::zeroed();
        let total = MAX_RECORDED_DRAWS + 10;
        for i in 0..total {
            uniforms.range_hi = i as f32;
            let call = DrawCall {
                program,
                geometry: &geometry,
                source: ScalarSource::Attribute(values),
                color_map,
                uniforms,
                model: Mat4::IDENTITY,
            };
            backend.draw(&call).unwrap();
        }

        assert_eq!(backend.stats().draw_calls, total);
        assert_eq!(backend.draws().len(), MAX_RECORDED_DRAWS);
        assert_eq!(backend.draws()[0].uniforms.range_hi, 10.0);
        assert_eq!(backend.last_draw().unwrap().uniforms.range_hi, (total - 1) as f32);
    }

    #[test]
    fn test_oversized_texture_rejected() {
        let mut backend = RecordingBackend::new();
        let limit = wgpu::Limits::default().max_texture_dimension_2d;
        let wide = vec![0.0; limit as usize + 1];
        let result = backend.create_scalar_texture("wide", limit + 1, 1, &wide);
        assert!(matches!(result, Err(RenderError::InvalidData(_))));
        assert_eq!(backend.stats().textures_created, 0);

        let fits = vec![0.0; limit as usize];
        assert!(backend.create_scalar_texture("fits", limit, 1, &fits).is_ok());
    }

    #[test]
    fn test_release_frees_resources() {
        let mut backend = RecordingBackend::new();
        let buffer = backend
            .create_attribute_buffer("values", AttributeLayout::Scalar, &[0.0])
            .unwrap();
        backend.release_buffer(buffer);
        backend.release_buffer(buffer);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.stats().buffers_released, 1);
        assert!(backend.buffer_data(buffer).is_none());
    }
}

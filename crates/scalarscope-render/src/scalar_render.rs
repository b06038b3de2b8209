//! Uniform blocks for the scalar shaders.

use glam::{Mat4, Vec3};
use scalarscope_core::ScalarMapping;

use crate::backend::TextureFilter;

/// Per-draw color mapping parameters.
/// Layout must match WGSL `ScalarUniforms` exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ScalarUniforms {
    /// Effective range lower bound.
    pub range_lo: f32,
    /// Effective range upper bound.
    pub range_hi: f32,
    /// `DataType` tag: 0 = standard, 1 = symmetric, 2 = magnitude.
    pub data_type: u32,
    /// Nonzero when the range is degenerate and every value maps to the midpoint.
    pub degenerate: u32,
    pub isolines_enabled: u32,
    /// Isoline band width in data units.
    pub isoline_width: f32,
    pub isoline_darkness: f32,
    /// 0 = bilinear, 1 = nearest. Only read by the texture variant.
    pub texture_filter: u32,
}

impl ScalarUniforms {
    /// Snapshots the mapping state for one draw.
    pub fn from_mapping(mapping: &ScalarMapping) -> Self {
        let (range_lo, range_hi, degenerate) = match mapping.effective_range() {
            Some(range) => (range.lo, range.hi, 0),
            None => (0.0, 1.0, 1),
        };
        Self {
            range_lo,
            range_hi,
            data_type: mapping.data_type().shader_tag(),
            degenerate,
            isolines_enabled: u32::from(mapping.isolines_enabled()),
            isoline_width: mapping.isoline_width(),
            isoline_darkness: mapping.isoline_darkness(),
            texture_filter: TextureFilter::Linear.shader_tag(),
        }
    }

    #[must_use]
    pub fn with_texture_filter(mut self, filter: TextureFilter) -> Self {
        self.texture_filter = filter.shader_tag();
        self
    }

    /// Mirrors `normalize_value` in the shaders.
    pub fn normalize(&self, value: f32) -> f32 {
        if self.degenerate != 0 || value.is_nan() {
            return 0.5;
        }
        ((value - self.range_lo) / (self.range_hi - self.range_lo)).clamp(0.0, 1.0)
    }
}

/// Camera and model transforms for one draw.
/// Layout must match WGSL `FrameUniforms` exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// World-space light direction, w unused.
    pub light_dir: [f32; 4],
}

impl FrameUniforms {
    pub fn new(view_proj: Mat4, model: Mat4, light_dir: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            light_dir: light_dir.extend(0.0).to_array(),
        }
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::new(0.3, 0.5, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use scalarscope_core::{DataType, DisplayRange, ScalarOptions};

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<ScalarUniforms>(), 32);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 144);
    }

    #[test]
    fn test_degenerate_mapping_sets_flag() {
        let mapping = ScalarMapping::new(vec![2.0; 8], DataType::Standard, &ScalarOptions::default());
        let uniforms = ScalarUniforms::from_mapping(&mapping);
        assert_eq!(uniforms.degenerate, 1);
        assert_eq!(uniforms.normalize(2.0), 0.5);
        assert_eq!(uniforms.normalize(-100.0), 0.5);
    }

    #[test]
    fn test_symmetric_uniforms() {
        let mapping = ScalarMapping::new(
            vec![-1.0, 0.0, 3.0],
            DataType::Symmetric,
            &ScalarOptions::default(),
        );
        let uniforms = ScalarUniforms::from_mapping(&mapping);
        assert_eq!(uniforms.data_type, 1);
        assert_eq!(uniforms.range_lo, -uniforms.range_hi);
    }

    proptest! {
        #[test]
        fn prop_uniform_normalize_matches_mapping(
            lo in -100.0f32..100.0,
            gap in 0.1f32..100.0,
            v in -500.0f32..500.0,
        ) {
            let mut mapping = ScalarMapping::new(
                vec![lo, lo + gap],
                DataType::Standard,
                &ScalarOptions::default(),
            );
            mapping.set_map_range(DisplayRange::new(lo, lo + gap));
            let uniforms = ScalarUniforms::from_mapping(&mapping);
            prop_assert_eq!(uniforms.normalize(v), mapping.normalize(v));
        }
    }
}

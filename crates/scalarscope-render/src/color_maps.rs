//! Color maps and their lookup tables.

use std::collections::HashMap;
use std::path::Path;

use glam::Vec3;

use crate::error::{RenderError, RenderResult};

/// Number of samples in a color map lookup texture.
pub const COLORMAP_RESOLUTION: u32 = 256;

/// A named gradient, sampled evenly over `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    pub name: String,
    pub colors: Vec<Vec3>,
}

impl ColorMap {
    pub fn new(name: impl Into<String>, colors: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    /// Samples the color map at `t`, clamped to `[0, 1]`, interpolating linearly
    /// between control colors.
    pub fn sample(&self, t: f32) -> Vec3 {
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        match self.colors.len() {
            0 => Vec3::ZERO,
            1 => self.colors[0],
            len => {
                let segments = len - 1;
                let scaled = t * segments as f32;
                let idx = (scaled.floor() as usize).min(segments - 1);
                let frac = scaled - idx as f32;
                self.colors[idx].lerp(self.colors[idx + 1], frac)
            }
        }
    }

    /// Returns `resolution` RGBA8 texels spanning the map, alpha opaque.
    pub fn lut_rgba8(&self, resolution: u32) -> Vec<u8> {
        let resolution = resolution.max(2);
        let mut pixels = Vec::with_capacity(resolution as usize * 4);
        for i in 0..resolution {
            let t = i as f32 / (resolution - 1) as f32;
            let color = self.sample(t);
            pixels.push(to_u8(color.x));
            pixels.push(to_u8(color.y));
            pixels.push(to_u8(color.z));
            pixels.push(255);
        }
        pixels
    }

    /// Reads a color map from an image whose horizontal axis is the gradient.
    ///
    /// The middle row is used, left to right.
    pub fn from_image(name: impl Into<String>, path: impl AsRef<Path>) -> RenderResult<Self> {
        let image = image::open(path.as_ref())?.to_rgb8();
        let (width, height) = image.dimensions();
        if width < 2 || height == 0 {
            return Err(RenderError::InvalidData(format!(
                "color map image must be at least 2 pixels wide, got {width}x{height}"
            )));
        }
        let row = height / 2;
        let colors = (0..width)
            .map(|x| {
                let [r, g, b] = image.get_pixel(x, row).0;
                Vec3::new(
                    f32::from(r) / 255.0,
                    f32::from(g) / 255.0,
                    f32::from(b) / 255.0,
                )
            })
            .collect();
        Ok(Self::new(name, colors))
    }
}

fn to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Named color maps available to quantities.
///
/// Quantities refer to maps by name; an unknown name is reported when the quantity
/// is drawn, not when it is set.
#[derive(Debug, Clone, Default)]
pub struct ColorMapRegistry {
    color_maps: HashMap<String, ColorMap>,
}

impl ColorMapRegistry {
    /// Creates a registry holding the built-in maps.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.register(ColorMap::new(
            "viridis",
            vec![
                Vec3::new(0.267, 0.004, 0.329),
                Vec3::new(0.282, 0.140, 0.457),
                Vec3::new(0.253, 0.265, 0.529),
                Vec3::new(0.206, 0.371, 0.553),
                Vec3::new(0.163, 0.471, 0.558),
                Vec3::new(0.127, 0.566, 0.550),
                Vec3::new(0.134, 0.658, 0.517),
                Vec3::new(0.266, 0.749, 0.440),
                Vec3::new(0.477, 0.821, 0.318),
                Vec3::new(0.741, 0.873, 0.150),
                Vec3::new(0.993, 0.906, 0.144),
            ],
        ));

        // Diverging, for symmetric data
        self.register(ColorMap::new(
            "coolwarm",
            vec![
                Vec3::new(0.230, 0.299, 0.754),
                Vec3::new(0.552, 0.690, 0.996),
                Vec3::new(0.866, 0.866, 0.866),
                Vec3::new(0.956, 0.604, 0.486),
                Vec3::new(0.706, 0.016, 0.150),
            ],
        ));

        // Sequential, for magnitudes
        self.register(ColorMap::new(
            "blues",
            vec![
                Vec3::new(0.969, 0.984, 1.000),
                Vec3::new(0.871, 0.922, 0.969),
                Vec3::new(0.776, 0.859, 0.937),
                Vec3::new(0.620, 0.792, 0.882),
                Vec3::new(0.419, 0.682, 0.839),
                Vec3::new(0.259, 0.573, 0.776),
                Vec3::new(0.129, 0.443, 0.710),
                Vec3::new(0.031, 0.318, 0.612),
                Vec3::new(0.031, 0.188, 0.420),
            ],
        ));

        self.register(ColorMap::new(
            "reds",
            vec![
                Vec3::new(1.000, 0.961, 0.941),
                Vec3::new(0.996, 0.878, 0.824),
                Vec3::new(0.988, 0.733, 0.631),
                Vec3::new(0.988, 0.573, 0.447),
                Vec3::new(0.984, 0.416, 0.290),
                Vec3::new(0.937, 0.231, 0.173),
                Vec3::new(0.796, 0.094, 0.114),
                Vec3::new(0.647, 0.059, 0.082),
                Vec3::new(0.404, 0.000, 0.051),
            ],
        ));

        self.register(ColorMap::new(
            "rainbow",
            vec![
                Vec3::new(0.5, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
            ],
        ));
    }

    /// Registers a color map, replacing any map with the same name.
    pub fn register(&mut self, color_map: ColorMap) {
        if self.color_maps.contains_key(&color_map.name) {
            log::debug!("replacing color map '{}'", color_map.name);
        }
        self.color_maps.insert(color_map.name.clone(), color_map);
    }

    /// Loads a color map from an image file and registers it under `name`.
    pub fn load_from_image(&mut self, name: &str, path: impl AsRef<Path>) -> RenderResult<()> {
        let color_map = ColorMap::from_image(name, path)?;
        log::info!(
            "loaded color map '{name}' with {} samples",
            color_map.colors.len()
        );
        self.register(color_map);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ColorMap> {
        self.color_maps.get(name)
    }

    /// Like [`ColorMapRegistry::get`], but an unknown name is an error.
    pub fn require(&self, name: &str) -> RenderResult<&ColorMap> {
        self.get(name)
            .ok_or_else(|| RenderError::UnknownColorMap(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.color_maps.contains_key(name)
    }

    /// Returns all color map names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.color_maps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_data_type_maps() {
        let registry = ColorMapRegistry::new();
        for name in ["viridis", "coolwarm", "blues", "reds", "rainbow"] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert_eq!(registry.names()[0], "blues");
    }

    #[test]
    fn test_sample_endpoints_and_clamp() {
        let map = ColorMap::new("bw", vec![Vec3::ZERO, Vec3::ONE]);
        assert_eq!(map.sample(0.0), Vec3::ZERO);
        assert_eq!(map.sample(1.0), Vec3::ONE);
        assert_eq!(map.sample(-4.0), Vec3::ZERO);
        assert_eq!(map.sample(0.5), Vec3::splat(0.5));
    }

    #[test]
    fn test_lut_size_and_ends() {
        let map = ColorMap::new("bw", vec![Vec3::ZERO, Vec3::ONE]);
        let lut = map.lut_rgba8(COLORMAP_RESOLUTION);
        assert_eq!(lut.len(), COLORMAP_RESOLUTION as usize * 4);
        assert_eq!(&lut[0..4], &[0, 0, 0, 255]);
        assert_eq!(&lut[lut.len() - 4..], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_require_unknown_is_error() {
        let registry = ColorMapRegistry::new();
        assert!(matches!(
            registry.require("nope"),
            Err(RenderError::UnknownColorMap(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_load_from_image() {
        let path = std::env::temp_dir().join("scalarscope_test_colormap.png");
        let mut img = image::RgbImage::new(4, 3);
        for x in 0..4 {
            for y in 0..3 {
                let v = (x * 85) as u8;
                img.put_pixel(x, y, image::Rgb([v, 0, 255 - v]));
            }
        }
        img.save(&path).unwrap();

        let mut registry = ColorMapRegistry::new();
        registry.load_from_image("custom", &path).unwrap();
        let map = registry.get("custom").unwrap();
        assert_eq!(map.colors.len(), 4);
        assert_eq!(map.colors[0], Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(map.colors[3], Vec3::new(1.0, 0.0, 0.0));

        let _ = std::fs::remove_file(path);
    }
}

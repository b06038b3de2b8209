//! Shared color-mapping state for scalar quantities.
//!
//! Every attachment-specific scalar quantity embeds one [`ScalarMapping`] and implements
//! [`ScalarQuantity`], which supplies the mapping API as provided methods. The trait is
//! used through generics, so each concrete quantity gets its own monomorphized copy of
//! the logic; the mesh-facing dynamic dispatch lives elsewhere.

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;
use crate::error::{Result, ScalarscopeError};
use crate::histogram::Histogram;
use crate::options::ScalarOptions;
use crate::quantity::{AttachmentKind, Quantity};
use crate::value_mapper::{self, DisplayRange};

/// Colormap, display range, and isoline state over one scalar buffer.
#[derive(Debug, Clone)]
pub struct ScalarMapping {
    values: Vec<f32>,
    histogram: Histogram,
    options: ScalarOptions,
    data_type: DataType,
    color_map: String,
    map_range: DisplayRange,
    isolines_enabled: bool,
    isoline_width: f32,
    isoline_darkness: f32,
}

impl ScalarMapping {
    /// Creates the mapping state for `values`, starting from the robust default range.
    pub fn new(values: Vec<f32>, data_type: DataType, options: &ScalarOptions) -> Self {
        let histogram = Histogram::build_with_options(&values, options);
        let mut mapping = Self {
            values,
            histogram,
            options: options.clone(),
            data_type,
            color_map: data_type.default_color_map().to_string(),
            map_range: DisplayRange::UNIT,
            isolines_enabled: false,
            isoline_width: 0.0,
            isoline_darkness: options.isoline_darkness.clamp(0.0, 1.0),
        };
        mapping.map_range = mapping.default_range();
        mapping.isoline_width = mapping.default_isoline_width();
        mapping
    }

    /// Returns the raw values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn histogram_mut(&mut self) -> &mut Histogram {
        &mut self.histogram
    }

    pub fn options(&self) -> &ScalarOptions {
        &self.options
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Switches the normalization policy, resetting the colormap and range to the
    /// defaults of the new policy.
    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
        self.color_map = data_type.default_color_map().to_string();
        self.map_range = self.default_range();
    }

    pub fn color_map(&self) -> &str {
        &self.color_map
    }

    pub fn set_color_map(&mut self, name: impl Into<String>) {
        self.color_map = name.into();
    }

    /// Returns the current display range.
    pub fn map_range(&self) -> DisplayRange {
        self.map_range
    }

    /// Sets the display range after applying the current policy with
    /// [`DataType::enforce`].
    ///
    /// Under `Standard` the range is stored as given. `Symmetric` widens it to
    /// `[-m, m]` and `Magnitude` anchors it at `[0, m]`, where `m` is the larger
    /// bound magnitude, so [`Self::map_range`] then differs from the input.
    pub fn set_map_range(&mut self, range: DisplayRange) {
        self.map_range = self.data_type.enforce(range);
    }

    /// Restores the histogram-derived default range.
    pub fn reset_map_range(&mut self) {
        self.map_range = self.default_range();
    }

    /// The robust percentile range of the data, with the current policy applied.
    pub fn default_range(&self) -> DisplayRange {
        let robust = self.histogram.robust_range(
            self.options.robust_lower_percentile,
            self.options.robust_upper_percentile,
        );
        self.data_type.enforce(robust)
    }

    /// Exact min/max of the finite data.
    pub fn data_range(&self) -> DisplayRange {
        self.histogram.data_range()
    }

    /// Range sent to shaders, or `None` when every value maps to the midpoint.
    pub fn effective_range(&self) -> Option<DisplayRange> {
        value_mapper::effective_range(self.map_range, self.data_type)
    }

    /// Normalizes a raw value with the current range and policy.
    pub fn normalize(&self, raw: f32) -> f32 {
        value_mapper::normalize(raw, self.map_range, self.data_type)
    }

    /// Replaces the raw values, rebuilding the histogram and resetting the range.
    pub fn replace_values(&mut self, values: Vec<f32>) {
        self.histogram = Histogram::build_with_options(&values, &self.options);
        self.values = values;
        self.map_range = self.default_range();
        self.isoline_width = self.default_isoline_width();
    }

    pub fn isolines_enabled(&self) -> bool {
        self.isolines_enabled
    }

    pub fn set_isolines_enabled(&mut self, enabled: bool) {
        self.isolines_enabled = enabled;
    }

    /// Width of one isoline band, in data units.
    pub fn isoline_width(&self) -> f32 {
        self.isoline_width
    }

    /// Sets the isoline band width. Non-positive widths are ignored.
    pub fn set_isoline_width(&mut self, width: f32) {
        if width > 0.0 && width.is_finite() {
            self.isoline_width = width;
        } else {
            log::warn!("ignoring isoline width {width}, must be positive");
        }
    }

    pub fn isoline_darkness(&self) -> f32 {
        self.isoline_darkness
    }

    pub fn set_isoline_darkness(&mut self, darkness: f32) {
        self.isoline_darkness = darkness.clamp(0.0, 1.0);
    }

    fn default_isoline_width(&self) -> f32 {
        let width = self.map_range.width() * self.options.isoline_width_fraction;
        if width > 0.0 && width.is_finite() {
            width
        } else {
            self.options.isoline_width_fraction
        }
    }

    /// Captures the user-editable view state.
    pub fn settings(&self) -> ScalarMappingSettings {
        ScalarMappingSettings {
            data_type: self.data_type,
            color_map: self.color_map.clone(),
            map_range: self.map_range,
            isolines_enabled: self.isolines_enabled,
            isoline_width: self.isoline_width,
            isoline_darkness: self.isoline_darkness,
        }
    }

    /// Restores view state captured by [`ScalarMapping::settings`].
    pub fn apply_settings(&mut self, settings: &ScalarMappingSettings) {
        self.data_type = settings.data_type;
        self.color_map.clone_from(&settings.color_map);
        self.set_map_range(settings.map_range);
        self.isolines_enabled = settings.isolines_enabled;
        self.set_isoline_width(settings.isoline_width);
        self.set_isoline_darkness(settings.isoline_darkness);
    }
}

/// Persistable view state of a scalar quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarMappingSettings {
    pub data_type: DataType,
    pub color_map: String,
    pub map_range: DisplayRange,
    pub isolines_enabled: bool,
    pub isoline_width: f32,
    pub isoline_darkness: f32,
}

impl ScalarMappingSettings {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Color-mapping API shared by all scalar quantities.
///
/// Implementors provide access to their [`ScalarMapping`] and two invalidation hooks;
/// setters only mark state stale, and GPU resources are rebuilt lazily on the next draw.
pub trait ScalarQuantity: Quantity {
    fn mapping(&self) -> &ScalarMapping;

    fn mapping_mut(&mut self) -> &mut ScalarMapping;

    /// Which mesh element kind the values are attached to.
    fn attachment_kind(&self) -> AttachmentKind;

    /// Marks the shader program stale (colormap or policy changed).
    fn invalidate_program(&mut self);

    /// Marks the uploaded values stale (values replaced).
    fn invalidate_values(&mut self);

    /// UI label identifying the quantity and its attachment kind.
    fn nice_name(&self) -> String {
        format!("{} ({} scalar)", self.name(), self.attachment_kind())
    }

    fn color_map(&self) -> &str {
        self.mapping().color_map()
    }

    /// Sets the colormap by name. The name is validated against the registry at draw time.
    fn set_color_map(&mut self, name: &str) -> &mut Self
    where
        Self: Sized,
    {
        self.mapping_mut().set_color_map(name);
        self.invalidate_program();
        self
    }

    fn data_type(&self) -> DataType {
        self.mapping().data_type()
    }

    fn set_data_type(&mut self, data_type: DataType) -> &mut Self
    where
        Self: Sized,
    {
        self.mapping_mut().set_data_type(data_type);
        self.invalidate_program();
        self
    }

    fn map_range(&self) -> DisplayRange {
        self.mapping().map_range()
    }

    /// Overrides the display range. Takes effect on the next draw without re-uploading data.
    ///
    /// The data type's policy is applied first (see [`ScalarMapping::set_map_range`]), so
    /// only a `Standard` quantity reads back exactly `(lo, hi)`.
    fn set_map_range(&mut self, lo: f32, hi: f32) -> &mut Self
    where
        Self: Sized,
    {
        self.mapping_mut().set_map_range(DisplayRange::new(lo, hi));
        self
    }

    fn reset_map_range(&mut self) -> &mut Self
    where
        Self: Sized,
    {
        self.mapping_mut().reset_map_range();
        self
    }

    fn data_range(&self) -> DisplayRange {
        self.mapping().data_range()
    }

    fn set_isolines_enabled(&mut self, enabled: bool) -> &mut Self
    where
        Self: Sized,
    {
        self.mapping_mut().set_isolines_enabled(enabled);
        self
    }

    fn set_isoline_width(&mut self, width: f32) -> &mut Self
    where
        Self: Sized,
    {
        self.mapping_mut().set_isoline_width(width);
        self
    }

    fn set_isoline_darkness(&mut self, darkness: f32) -> &mut Self
    where
        Self: Sized,
    {
        self.mapping_mut().set_isoline_darkness(darkness);
        self
    }

    /// Replaces the values. The new buffer must have the same length as the old one.
    fn update_values(&mut self, values: Vec<f32>) -> Result<()>
    where
        Self: Sized,
    {
        let expected = self.mapping().len();
        if values.len() != expected {
            return Err(ScalarscopeError::DimensionMismatch {
                quantity: self.name().to_string(),
                kind: self.attachment_kind(),
                expected,
                actual: values.len(),
            });
        }
        self.mapping_mut().replace_values(values);
        self.invalidate_values();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(values: Vec<f32>) -> ScalarMapping {
        ScalarMapping::new(values, DataType::Standard, &ScalarOptions::default())
    }

    #[test]
    fn test_new_uses_robust_default() {
        let mut values: Vec<f32> = (0..1000).map(|i| i as f32 / 999.0).collect();
        values.extend([1000.0, 1000.0]);
        let m = mapping(values);
        assert!(m.map_range().hi < 1.01);
        assert_eq!(m.data_range().hi, 1000.0);
        assert_eq!(m.color_map(), "viridis");
    }

    #[test]
    fn test_set_range_round_trip_and_reset() {
        let mut m = mapping(vec![0.0, 1.0, 2.0, 3.0]);
        let default = m.map_range();

        m.set_map_range(DisplayRange::new(-4.0, 17.5));
        assert_eq!(m.map_range(), DisplayRange { lo: -4.0, hi: 17.5 });

        m.reset_map_range();
        assert_eq!(m.map_range(), default);
    }

    #[test]
    fn test_set_range_applies_policy() {
        let mut m = mapping(vec![-1.0, 0.0, 2.0, 4.0]);
        m.set_data_type(DataType::Symmetric);
        m.set_map_range(DisplayRange::new(-1.0, 4.0));
        assert_eq!(m.map_range(), DisplayRange { lo: -4.0, hi: 4.0 });

        m.set_data_type(DataType::Magnitude);
        m.set_map_range(DisplayRange::new(-1.0, 4.0));
        assert_eq!(m.map_range(), DisplayRange { lo: 0.0, hi: 4.0 });

        m.set_map_range(DisplayRange::new(0.0, 2.5));
        assert_eq!(m.map_range(), DisplayRange { lo: 0.0, hi: 2.5 });
    }

    #[test]
    fn test_set_data_type_recomputes_range() {
        let mut m = mapping(vec![-1.0, 0.0, 2.0, 4.0]);
        m.set_data_type(DataType::Symmetric);
        assert_eq!(m.map_range().lo, -m.map_range().hi);
        assert_eq!(m.color_map(), "coolwarm");
        assert_eq!(m.normalize(0.0), 0.5);

        m.set_data_type(DataType::Magnitude);
        assert_eq!(m.map_range().lo, 0.0);
        assert_eq!(m.normalize(-1.0), 0.0);
    }

    #[test]
    fn test_empty_values() {
        let m = mapping(Vec::new());
        assert!(m.is_empty());
        assert_eq!(m.map_range(), DisplayRange::UNIT);
        assert!(m.isoline_width() > 0.0);
    }

    #[test]
    fn test_settings_json_round_trip() {
        let mut m = mapping(vec![0.0, 1.0, 2.0]);
        m.set_color_map("reds");
        m.set_map_range(DisplayRange::new(0.25, 1.5));
        m.set_isolines_enabled(true);

        let json = m.settings().to_json().unwrap();
        let restored = ScalarMappingSettings::from_json(&json).unwrap();

        let mut other = mapping(vec![5.0, 6.0, 7.0]);
        other.apply_settings(&restored);
        assert_eq!(other.color_map(), "reds");
        assert_eq!(other.map_range(), DisplayRange { lo: 0.25, hi: 1.5 });
        assert!(other.isolines_enabled());
    }

    #[test]
    fn test_isoline_setters_validate() {
        let mut m = mapping(vec![0.0, 10.0]);
        let width = m.isoline_width();
        m.set_isoline_width(-1.0);
        assert_eq!(m.isoline_width(), width);
        m.set_isoline_darkness(3.0);
        assert_eq!(m.isoline_darkness(), 1.0);
    }
}

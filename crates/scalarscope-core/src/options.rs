//! Configuration options for scalar quantities.

use serde::{Deserialize, Serialize};

/// Options shared by every scalar quantity a structure creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalarOptions {
    /// Number of density buckets in each histogram.
    pub histogram_bucket_count: usize,

    /// Lower percentile of the robust default range, in `[0, 1]`.
    pub robust_lower_percentile: f32,

    /// Upper percentile of the robust default range, in `[0, 1]`.
    pub robust_upper_percentile: f32,

    /// Data whose span is below this fraction of its magnitude is "narrow" and
    /// uses its exact min/max instead of percentiles.
    pub narrow_range_epsilon: f32,

    /// How strongly isolines darken the underlying color, in `[0, 1]`.
    pub isoline_darkness: f32,

    /// Default isoline width as a fraction of the display range width.
    pub isoline_width_fraction: f32,
}

impl Default for ScalarOptions {
    fn default() -> Self {
        Self {
            histogram_bucket_count: 50,
            robust_lower_percentile: 0.02,
            robust_upper_percentile: 0.98,
            narrow_range_epsilon: 1e-5,
            isoline_darkness: 0.7,
            isoline_width_fraction: 0.05,
        }
    }
}

impl ScalarOptions {
    /// Loads options from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

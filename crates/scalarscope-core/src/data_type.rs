//! Normalization policies for scalar data.

use serde::{Deserialize, Serialize};

use crate::value_mapper::DisplayRange;

/// How a raw data range becomes a display range, and which colormap suits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataType {
    /// Linear map over an arbitrary `[min, max]`.
    #[default]
    Standard,
    /// Range forced symmetric about zero; use a diverging colormap.
    Symmetric,
    /// Range anchored at zero; only the upper bound matters.
    Magnitude,
}

impl DataType {
    /// All data types, for UI pickers.
    pub const ALL: [DataType; 3] = [DataType::Standard, DataType::Symmetric, DataType::Magnitude];

    /// The colormap a freshly created quantity of this type starts with.
    pub fn default_color_map(self) -> &'static str {
        match self {
            DataType::Standard => "viridis",
            DataType::Symmetric => "coolwarm",
            DataType::Magnitude => "blues",
        }
    }

    /// Tag passed to shaders.
    pub fn shader_tag(self) -> u32 {
        match self {
            DataType::Standard => 0,
            DataType::Symmetric => 1,
            DataType::Magnitude => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DataType::Standard => "standard",
            DataType::Symmetric => "symmetric",
            DataType::Magnitude => "magnitude",
        }
    }

    /// Applies this policy to a range.
    ///
    /// `Symmetric` widens to `[-m, m]` with `m = max(|lo|, |hi|)`; `Magnitude` pins
    /// `lo` to zero and keeps the larger absolute bound as `hi`.
    pub fn enforce(self, range: DisplayRange) -> DisplayRange {
        match self {
            DataType::Standard => range,
            DataType::Symmetric => {
                let m = range.lo.abs().max(range.hi.abs());
                DisplayRange { lo: -m, hi: m }
            }
            DataType::Magnitude => DisplayRange {
                lo: 0.0,
                hi: range.lo.abs().max(range.hi.abs()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_enforce() {
        let r = DataType::Symmetric.enforce(DisplayRange::new(-1.0, 3.0));
        assert_eq!(r.lo, -3.0);
        assert_eq!(r.hi, 3.0);

        let r = DataType::Symmetric.enforce(DisplayRange::new(-5.0, 2.0));
        assert_eq!(r.lo, -r.hi);
        assert_eq!(r.hi, 5.0);
    }

    #[test]
    fn test_magnitude_enforce() {
        let r = DataType::Magnitude.enforce(DisplayRange::new(0.5, 4.0));
        assert_eq!(r.lo, 0.0);
        assert_eq!(r.hi, 4.0);

        // All-negative input still produces a usable upper bound
        let r = DataType::Magnitude.enforce(DisplayRange::new(-6.0, -1.0));
        assert_eq!(r.lo, 0.0);
        assert_eq!(r.hi, 6.0);
    }

    #[test]
    fn test_default_color_maps() {
        assert_eq!(DataType::Standard.default_color_map(), "viridis");
        assert_eq!(DataType::Symmetric.default_color_map(), "coolwarm");
        assert_eq!(DataType::Magnitude.default_color_map(), "blues");
    }
}

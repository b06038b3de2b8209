//! Mapping raw scalar values into normalized colormap coordinates.
//!
//! [`normalize`] is the CPU reference of the normalization performed in the scalar
//! shaders. It is a pure function and may be called from any thread.

use serde::{Deserialize, Serialize};

use crate::data_type::DataType;

/// The `[lo, hi]` interval used to normalize raw values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRange {
    pub lo: f32,
    pub hi: f32,
}

impl DisplayRange {
    /// The unit range, used whenever there is no data to derive a range from.
    pub const UNIT: DisplayRange = DisplayRange { lo: 0.0, hi: 1.0 };

    /// Creates a range, swapping the bounds if they are reversed.
    pub fn new(lo: f32, hi: f32) -> Self {
        if lo > hi {
            log::warn!("display range [{lo}, {hi}] is reversed, swapping bounds");
            Self { lo: hi, hi: lo }
        } else {
            Self { lo, hi }
        }
    }

    pub fn width(self) -> f32 {
        self.hi - self.lo
    }

    /// Returns true if the range is too narrow to divide by.
    ///
    /// The threshold is relative to the magnitude of the bounds, with a floor of one,
    /// so both `[5, 5]` and `[1e6, 1e6 + 0.01]` count as degenerate.
    pub fn is_degenerate(self) -> bool {
        let scale = self.lo.abs().max(self.hi.abs()).max(1.0);
        !(self.width() > f32::EPSILON * scale)
    }

    pub fn contains(self, value: f32) -> bool {
        value >= self.lo && value <= self.hi
    }
}

impl Default for DisplayRange {
    fn default() -> Self {
        Self::UNIT
    }
}

impl From<(f32, f32)> for DisplayRange {
    fn from((lo, hi): (f32, f32)) -> Self {
        Self::new(lo, hi)
    }
}

/// Returns the range actually used for normalization, or `None` if every value
/// should map to the midpoint.
pub fn effective_range(range: DisplayRange, data_type: DataType) -> Option<DisplayRange> {
    if range.is_degenerate() {
        return None;
    }
    let effective = data_type.enforce(range);
    if effective.is_degenerate() {
        None
    } else {
        Some(effective)
    }
}

/// Normalizes `raw` into `[0, 1]` under the given range and policy.
///
/// Degenerate ranges and NaN inputs map to `0.5`.
pub fn normalize(raw: f32, range: DisplayRange, data_type: DataType) -> f32 {
    if raw.is_nan() {
        return 0.5;
    }
    match effective_range(range, data_type) {
        Some(r) => ((raw - r.lo) / r.width()).clamp(0.0, 1.0),
        None => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_standard_endpoints() {
        let range = DisplayRange::new(-2.0, 6.0);
        assert_eq!(normalize(-2.0, range, DataType::Standard), 0.0);
        assert_eq!(normalize(6.0, range, DataType::Standard), 1.0);
        assert_eq!(normalize(2.0, range, DataType::Standard), 0.5);
        assert_eq!(normalize(100.0, range, DataType::Standard), 1.0);
        assert_eq!(normalize(-100.0, range, DataType::Standard), 0.0);
    }

    #[test]
    fn test_degenerate_range_maps_to_midpoint() {
        let range = DisplayRange::new(3.0, 3.0);
        for data_type in DataType::ALL {
            for v in [-10.0, 0.0, 3.0, 1e9] {
                assert_eq!(normalize(v, range, data_type), 0.5);
            }
        }
    }

    #[test]
    fn test_symmetric_centers_zero() {
        let range = DisplayRange::new(-1.0, 4.0);
        assert_eq!(normalize(0.0, range, DataType::Symmetric), 0.5);
        assert_eq!(normalize(-4.0, range, DataType::Symmetric), 0.0);
        assert_eq!(normalize(4.0, range, DataType::Symmetric), 1.0);
    }

    #[test]
    fn test_magnitude_clamps_negative() {
        let range = DisplayRange::new(0.0, 2.0);
        assert_eq!(normalize(-3.0, range, DataType::Magnitude), 0.0);
        assert_eq!(normalize(1.0, range, DataType::Magnitude), 0.5);
    }

    #[test]
    fn test_nan_and_infinite_inputs() {
        let range = DisplayRange::new(0.0, 1.0);
        assert_eq!(normalize(f32::NAN, range, DataType::Standard), 0.5);
        assert_eq!(normalize(f32::INFINITY, range, DataType::Standard), 1.0);
        assert_eq!(normalize(f32::NEG_INFINITY, range, DataType::Standard), 0.0);
    }

    #[test]
    fn test_reversed_range_is_swapped() {
        let range = DisplayRange::new(5.0, 1.0);
        assert_eq!(range.lo, 1.0);
        assert_eq!(range.hi, 5.0);
    }

    proptest! {
        #[test]
        fn prop_standard_in_unit_interval_and_exact_endpoints(
            lo in -1000.0f32..1000.0,
            gap in 0.01f32..1000.0,
            v in -1.0e4f32..1.0e4,
        ) {
            let range = DisplayRange::new(lo, lo + gap);
            let t = normalize(v, range, DataType::Standard);
            prop_assert!((0.0..=1.0).contains(&t));
            prop_assert_eq!(normalize(range.lo, range, DataType::Standard), 0.0);
            prop_assert_eq!(normalize(range.hi, range, DataType::Standard), 1.0);
        }

        #[test]
        fn prop_standard_monotonic(
            lo in -1000.0f32..1000.0,
            gap in 0.01f32..1000.0,
            a in -1.0e4f32..1.0e4,
            b in -1.0e4f32..1.0e4,
        ) {
            let range = DisplayRange::new(lo, lo + gap);
            let (small, large) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                normalize(small, range, DataType::Standard)
                    <= normalize(large, range, DataType::Standard)
            );
        }

        #[test]
        fn prop_degenerate_is_midpoint_for_every_policy(c in -1.0e6f32..1.0e6, v in -1.0e6f32..1.0e6) {
            let range = DisplayRange::new(c, c);
            for data_type in DataType::ALL {
                prop_assert_eq!(normalize(v, range, data_type), 0.5);
            }
        }

        #[test]
        fn prop_symmetric_policy(lo in -1000.0f32..1000.0, gap in 0.01f32..1000.0) {
            let range = DataType::Symmetric.enforce(DisplayRange::new(lo, lo + gap));
            prop_assert_eq!(range.lo, -range.hi);
            if !range.is_degenerate() {
                prop_assert_eq!(normalize(0.0, range, DataType::Symmetric), 0.5);
            }
        }

        #[test]
        fn prop_magnitude_policy(
            lo in -1000.0f32..1000.0,
            gap in 0.01f32..1000.0,
            v in -1.0e4f32..0.0,
        ) {
            let range = DataType::Magnitude.enforce(DisplayRange::new(lo, lo + gap));
            prop_assert_eq!(range.lo, 0.0);
            let t = normalize(v, range, DataType::Magnitude);
            prop_assert!(t == 0.0 || range.is_degenerate());
        }
    }
}

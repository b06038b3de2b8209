//! Density histograms and robust range selection over scalar data.
//!
//! A [`Histogram`] is a read-only snapshot of a value buffer. It is rebuilt only when
//! the values are replaced (the build sorts a copy, `O(n log n)`); percentile lookups
//! afterwards are `O(1)`.

use crate::options::ScalarOptions;
use crate::value_mapper::DisplayRange;

/// The robust range is abandoned when it is narrower than this fraction of the data span.
const ROBUST_COLLAPSE_FRACTION: f32 = 1e-3;

/// Derived density and percentile structure over a scalar population.
#[derive(Debug, Clone)]
pub struct Histogram {
    buckets: Vec<u32>,
    /// Finite values, ascending.
    sorted: Vec<f32>,
    data_range: DisplayRange,
    narrow_epsilon: f32,
    /// Sub-range highlighted in the UI. Never feeds back into a display range.
    highlight: Option<DisplayRange>,
}

impl Histogram {
    /// Builds a histogram with `bucket_count` equal-width buckets.
    ///
    /// Non-finite values are ignored. An empty input yields all-zero buckets over `[0, 1]`.
    pub fn build(values: &[f32], bucket_count: usize) -> Self {
        Self::build_with_epsilon(values, bucket_count, ScalarOptions::default().narrow_range_epsilon)
    }

    /// Builds a histogram using the bucket count and narrow-range threshold of `options`.
    pub fn build_with_options(values: &[f32], options: &ScalarOptions) -> Self {
        Self::build_with_epsilon(
            values,
            options.histogram_bucket_count,
            options.narrow_range_epsilon,
        )
    }

    fn build_with_epsilon(values: &[f32], bucket_count: usize, narrow_epsilon: f32) -> Self {
        let bucket_count = bucket_count.max(1);
        let mut sorted: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f32::total_cmp);

        let mut buckets = vec![0u32; bucket_count];
        let data_range = match (sorted.first(), sorted.last()) {
            (Some(&min), Some(&max)) => DisplayRange { lo: min, hi: max },
            _ => DisplayRange::UNIT,
        };

        let span = data_range.width();
        for &v in &sorted {
            let idx = if span > 0.0 {
                let t = (v - data_range.lo) / span;
                ((t * bucket_count as f32).floor() as usize).min(bucket_count - 1)
            } else {
                bucket_count / 2
            };
            buckets[idx] += 1;
        }

        if values.len() != sorted.len() {
            log::debug!(
                "histogram ignored {} non-finite values",
                values.len() - sorted.len()
            );
        }

        Self {
            buckets,
            sorted,
            data_range,
            narrow_epsilon,
            highlight: None,
        }
    }

    /// Number of finite values the histogram was built from.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Per-bucket value counts, lowest bucket first.
    pub fn buckets(&self) -> &[u32] {
        &self.buckets
    }

    /// Exact min/max of the finite data, or `[0, 1]` when empty.
    pub fn data_range(&self) -> DisplayRange {
        self.data_range
    }

    /// Returns the value at percentile `p` (clamped to `[0, 1]`), interpolating
    /// linearly between neighbouring order statistics.
    pub fn percentile(&self, p: f32) -> f32 {
        let p = if p.is_nan() { 0.5 } else { p.clamp(0.0, 1.0) };
        let n = self.sorted.len();
        match n {
            0 => self.data_range.lo + p * self.data_range.width(),
            1 => self.sorted[0],
            _ => {
                let pos = p * (n - 1) as f32;
                let i = (pos.floor() as usize).min(n - 2);
                let frac = pos - i as f32;
                self.sorted[i] + (self.sorted[i + 1] - self.sorted[i]) * frac
            }
        }
    }

    /// Returns true if the data spread is negligible relative to its magnitude.
    pub fn is_narrow(&self) -> bool {
        let scale = self.data_range.lo.abs().max(self.data_range.hi.abs());
        self.data_range.width() <= self.narrow_epsilon * scale
    }

    /// Returns a range spanning the given percentiles, excluding outliers.
    ///
    /// Narrow data, and data whose percentile range would collapse to a sliver of
    /// the full span, fall back to the exact `[min, max]`.
    pub fn robust_range(&self, lo_percentile: f32, hi_percentile: f32) -> DisplayRange {
        if self.is_empty() || self.is_narrow() {
            return self.data_range;
        }
        let lo = self.percentile(lo_percentile.min(hi_percentile));
        let hi = self.percentile(hi_percentile.max(lo_percentile));
        if hi - lo <= ROBUST_COLLAPSE_FRACTION * self.data_range.width() {
            return self.data_range;
        }
        DisplayRange { lo, hi }
    }

    /// Returns `(x, height)` pairs for the density curve: `x` is the bucket center in
    /// data units and `height` is normalized so the tallest bucket is 1.
    pub fn curve(&self) -> Vec<[f32; 2]> {
        let tallest = self.buckets.iter().copied().max().unwrap_or(0).max(1) as f32;
        let width = self.data_range.width() / self.buckets.len() as f32;
        self.buckets
            .iter()
            .enumerate()
            .map(|(i, &count)| {
                let x = self.data_range.lo + (i as f32 + 0.5) * width;
                [x, count as f32 / tallest]
            })
            .collect()
    }

    /// Gets the highlighted sub-range, if any.
    pub fn highlight(&self) -> Option<DisplayRange> {
        self.highlight
    }

    pub fn set_highlight(&mut self, range: DisplayRange) {
        self.highlight = Some(range);
    }

    pub fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    /// Moves the lower bound of `current`, clamped to the data minimum and to `current.hi`.
    pub fn drag_lower(&self, current: DisplayRange, new_lo: f32) -> DisplayRange {
        let lo = new_lo.max(self.data_range.lo).min(current.hi);
        DisplayRange { lo, hi: current.hi }
    }

    /// Moves the upper bound of `current`, clamped to the data maximum and to `current.lo`.
    pub fn drag_upper(&self, current: DisplayRange, new_hi: f32) -> DisplayRange {
        let hi = new_hi.min(self.data_range.hi).max(current.lo);
        DisplayRange { lo: current.lo, hi }
    }

    /// Largest absolute value in the data. Bounds symmetric and magnitude ranges.
    pub fn max_magnitude(&self) -> f32 {
        self.data_range.lo.abs().max(self.data_range.hi.abs())
    }

    /// Moves either bound of a symmetric range; the result is `[-m, m]` with `m`
    /// clamped to the data's largest magnitude.
    pub fn drag_symmetric(&self, new_bound: f32) -> DisplayRange {
        let m = new_bound.abs().min(self.max_magnitude());
        DisplayRange { lo: -m, hi: m }
    }

    /// Moves the upper bound of a magnitude range, clamped to `[0, max_magnitude]`.
    pub fn drag_magnitude(&self, new_hi: f32) -> DisplayRange {
        DisplayRange {
            lo: 0.0,
            hi: new_hi.clamp(0.0, self.max_magnitude()),
        }
    }

    /// Shifts both bounds by `delta`, keeping the window inside the data range.
    pub fn drag_window(&self, current: DisplayRange, delta: f32) -> DisplayRange {
        let data = self.data_range;
        if current.width() >= data.width() {
            return data;
        }
        let shift = delta
            .max(data.lo - current.lo)
            .min(data.hi - current.hi);
        DisplayRange {
            lo: current.lo + shift,
            hi: current.hi + shift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_with_outliers() -> Vec<f32> {
        let mut values: Vec<f32> = (0..1000).map(|i| i as f32 / 999.0).collect();
        values.push(1000.0);
        values.push(1000.0);
        values
    }

    #[test]
    fn test_empty_histogram() {
        let hist = Histogram::build(&[], 10);
        assert!(hist.is_empty());
        assert_eq!(hist.buckets().len(), 10);
        assert!(hist.buckets().iter().all(|&c| c == 0));
        assert_eq!(hist.data_range(), DisplayRange::UNIT);
        assert_eq!(hist.robust_range(0.02, 0.98), DisplayRange::UNIT);
        assert_eq!(hist.curve().len(), 10);
    }

    #[test]
    fn test_bucket_counts_sum_to_len() {
        let values: Vec<f32> = (0..100).map(|i| (i % 17) as f32).collect();
        let hist = Histogram::build(&values, 8);
        let total: u32 = hist.buckets().iter().sum();
        assert_eq!(total as usize, values.len());
        // Max value lands in the last bucket, not past it
        assert!(hist.buckets()[7] > 0);
    }

    #[test]
    fn test_robust_range_excludes_outliers() {
        let hist = Histogram::build(&uniform_with_outliers(), 50);
        let range = hist.robust_range(0.02, 0.98);
        assert!(range.hi < 1.01, "hi should be near 1, got {}", range.hi);
        assert!(range.hi > 0.9, "hi should be near 1, got {}", range.hi);
        assert!(range.lo < 0.05);
        assert_eq!(hist.data_range().hi, 1000.0);
    }

    #[test]
    fn test_near_constant_data_uses_exact_range() {
        let values: Vec<f32> = (0..100)
            .map(|i| if i % 2 == 0 { 5.0 + 1e-9 } else { 5.0 - 1e-9 })
            .collect();
        let hist = Histogram::build(&values, 20);
        assert!(hist.is_narrow());
        let range = hist.robust_range(0.02, 0.98);
        assert_eq!(range, hist.data_range());
        assert!(range.lo <= 5.0 && range.hi >= 5.0);
    }

    #[test]
    fn test_mostly_constant_data_falls_back() {
        // Percentiles all land on 0, but the data has real spread
        let mut values = vec![0.0f32; 1000];
        values.push(10.0);
        let hist = Histogram::build(&values, 20);
        assert!(!hist.is_narrow());
        let range = hist.robust_range(0.02, 0.98);
        assert_eq!(range, DisplayRange { lo: 0.0, hi: 10.0 });
    }

    #[test]
    fn test_percentile_interpolates() {
        let hist = Histogram::build(&[0.0, 10.0], 4);
        assert_eq!(hist.percentile(0.0), 0.0);
        assert_eq!(hist.percentile(1.0), 10.0);
        assert_eq!(hist.percentile(0.25), 2.5);
        assert_eq!(hist.percentile(7.0), 10.0);
    }

    #[test]
    fn test_non_finite_values_ignored() {
        let hist = Histogram::build(&[1.0, f32::NAN, 3.0, f32::INFINITY], 4);
        assert_eq!(hist.len(), 2);
        assert_eq!(hist.data_range(), DisplayRange { lo: 1.0, hi: 3.0 });
    }

    #[test]
    fn test_drag_clamps_to_data_and_order() {
        let hist = Histogram::build(&[0.0, 1.0, 2.0, 10.0], 4);
        let current = DisplayRange { lo: 1.0, hi: 5.0 };

        assert_eq!(hist.drag_lower(current, -3.0).lo, 0.0);
        assert_eq!(hist.drag_lower(current, 7.0).lo, 5.0);
        assert_eq!(hist.drag_upper(current, 42.0).hi, 10.0);
        assert_eq!(hist.drag_upper(current, 0.5).hi, 1.0);

        let shifted = hist.drag_window(current, 100.0);
        assert_eq!(shifted, DisplayRange { lo: 6.0, hi: 10.0 });
        let shifted = hist.drag_window(current, -100.0);
        assert_eq!(shifted, DisplayRange { lo: 0.0, hi: 4.0 });
    }

    #[test]
    fn test_policy_drags_stay_within_data_magnitude() {
        let hist = Histogram::build(&[-1.0, 0.5, 2.0], 4);
        assert_eq!(hist.max_magnitude(), 2.0);

        assert_eq!(hist.drag_symmetric(1.5), DisplayRange { lo: -1.5, hi: 1.5 });
        assert_eq!(hist.drag_symmetric(-40.0), DisplayRange { lo: -2.0, hi: 2.0 });
        assert_eq!(hist.drag_symmetric(250.0), DisplayRange { lo: -2.0, hi: 2.0 });

        assert_eq!(hist.drag_magnitude(1.0), DisplayRange { lo: 0.0, hi: 1.0 });
        assert_eq!(hist.drag_magnitude(-3.0), DisplayRange { lo: 0.0, hi: 0.0 });
        assert_eq!(hist.drag_magnitude(99.0), DisplayRange { lo: 0.0, hi: 2.0 });
    }

    #[test]
    fn test_curve_is_normalized() {
        let hist = Histogram::build(&[0.0, 0.1, 0.2, 1.0], 2);
        let curve = hist.curve();
        assert_eq!(curve.len(), 2);
        assert_eq!(curve[0][1], 1.0);
        assert!((curve[1][1] - 1.0 / 3.0).abs() < 1e-6);
        assert!((curve[0][0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_highlight_is_independent() {
        let mut hist = Histogram::build(&[0.0, 1.0], 4);
        hist.set_highlight(DisplayRange { lo: 0.2, hi: 0.4 });
        assert_eq!(hist.highlight(), Some(DisplayRange { lo: 0.2, hi: 0.4 }));
        hist.clear_highlight();
        assert!(hist.highlight().is_none());
    }
}

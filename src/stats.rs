//! Descriptive statistics for simulated samples and interval widths.
//!
//! Every function handles empty and non-finite input explicitly by
//! returning `None`, so callers decide how a degenerate sample is reported.
//!
//! # Algorithms
//!
//! - **Mean**: Neumaier-compensated summation, error independent of n.
//! - **Variance/StdDev**: Welford's online update with Bessel's correction.
//!   Reference: Welford (1962), "Note on a Method for Calculating
//!   Corrected Sums of Squares and Products", *Technometrics* 4(3).
//! - **Quantile**: R-7 linear interpolation (default in R and NumPy).
//!   Reference: Hyndman & Fan (1996), *The American Statistician* 50(4).
//! - **Histogram**: equal-width bins over `[min, max]`, the layout used by
//!   common plotting libraries.

/// Compensated sum of `data` (Neumaier's variant of Kahan summation).
///
/// # Complexity
/// Time: O(n), Space: O(1)
pub fn kahan_sum(data: &[f64]) -> f64 {
    let (sum, compensation) = data.iter().fold((0.0_f64, 0.0_f64), |(sum, c), &x| {
        let t = sum + x;
        let c = if sum.abs() >= x.abs() {
            c + ((sum - t) + x)
        } else {
            c + ((x - t) + sum)
        };
        (t, c)
    });
    sum + compensation
}

/// Arithmetic mean via compensated summation.
///
/// # Returns
/// - `None` if `data` is empty or contains NaN/Inf.
///
/// # Examples
/// ```
/// use ci_coverage::stats::mean;
/// assert!((mean(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap() - 3.0).abs() < 1e-15);
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    Some(kahan_sum(data) / data.len() as f64)
}

/// Sample variance (denominator `n − 1`).
///
/// # Returns
/// - `None` if `data.len() < 2` or contains NaN/Inf.
///
/// # Examples
/// ```
/// use ci_coverage::stats::variance;
/// let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((variance(&v).unwrap() - 4.571428571428571).abs() < 1e-10);
/// ```
pub fn variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 || !all_finite(data) {
        return None;
    }
    let mut acc = WelfordAccumulator::new();
    data.iter().for_each(|&x| acc.update(x));
    acc.sample_variance()
}

/// Sample standard deviation, `sqrt(variance(data))`.
///
/// # Returns
/// - `None` if `data.len() < 2` or contains NaN/Inf.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

/// Smallest value, or `None` if `data` is empty or contains NaN.
pub fn min(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    data.iter()
        .try_fold(f64::INFINITY, |acc, &x| (!x.is_nan()).then(|| acc.min(x)))
}

/// Largest value, or `None` if `data` is empty or contains NaN.
pub fn max(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    data.iter()
        .try_fold(f64::NEG_INFINITY, |acc, &x| (!x.is_nan()).then(|| acc.max(x)))
}

/// `p`-th quantile using R-7 linear interpolation.
///
/// Sorts a copy of the input; the caller's slice is left untouched.
///
/// # Returns
/// - `None` if `data` is empty, contains NaN, or `p ∉ [0, 1]`.
///
/// # Examples
/// ```
/// use ci_coverage::stats::quantile;
/// let data = [5.0, 1.0, 3.0, 2.0, 4.0];
/// assert_eq!(quantile(&data, 0.0), Some(1.0));
/// assert_eq!(quantile(&data, 0.5), Some(3.0));
/// assert_eq!(quantile(&data, 1.0), Some(5.0));
/// ```
pub fn quantile(data: &[f64], p: f64) -> Option<f64> {
    if data.is_empty() || !(0.0..=1.0).contains(&p) || data.iter().any(|x| x.is_nan()) {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    let h = (sorted.len() - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();
    match sorted.get(j + 1) {
        Some(&next) => Some((1.0 - g) * sorted[j] + g * next),
        None => Some(sorted[j]),
    }
}

/// Median, the R-7 quantile at `p = 0.5`.
pub fn median(data: &[f64]) -> Option<f64> {
    quantile(data, 0.5)
}

fn all_finite(data: &[f64]) -> bool {
    data.iter().all(|x| x.is_finite())
}

// ---------------------------------------------------------------------------
// Welford online accumulator
// ---------------------------------------------------------------------------

/// Streaming mean/variance accumulator.
///
/// Maintains the running mean and the sum of squared deviations `M₂`,
/// which avoids the cancellation of the textbook `E[X²] − E[X]²` formula.
///
/// # Examples
/// ```
/// use ci_coverage::stats::WelfordAccumulator;
/// let mut acc = WelfordAccumulator::new();
/// for &x in &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     acc.update(x);
/// }
/// assert!((acc.mean().unwrap() - 5.0).abs() < 1e-15);
/// assert!((acc.sample_variance().unwrap() - 4.571428571428571).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WelfordAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
}

impl WelfordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one observation.
    pub fn update(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Running mean, or `None` before the first observation.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample variance (n − 1 denominator), or `None` with fewer than two
    /// observations.
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count > 1).then(|| self.m2 / (self.count - 1) as f64)
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// One equal-width histogram bin covering `[lower, upper)`; the last bin
/// is closed on the right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Partitions `data` into `bins` equal-width bins spanning its range.
///
/// When every value is identical the range is widened to `[x − 0.5, x + 0.5]`
/// so the single value still lands in a bin of non-zero width.
///
/// # Returns
/// - `None` if `data` is empty, `bins == 0`, or any value is non-finite.
///
/// # Examples
/// ```
/// use ci_coverage::stats::histogram;
/// let h = histogram(&[0.0, 0.1, 0.6, 1.0], 2).unwrap();
/// assert_eq!(h.len(), 2);
/// assert_eq!(h[0].count, 2);
/// assert_eq!(h[1].count, 2);
/// ```
pub fn histogram(data: &[f64], bins: usize) -> Option<Vec<HistogramBin>> {
    if bins == 0 || !all_finite(data) {
        return None;
    }
    let (mut lo, mut hi) = (min(data)?, max(data)?);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + i as f64 * width,
            upper: if i + 1 == bins { hi } else { lo + (i + 1) as f64 * width },
            count: 0,
        })
        .collect();

    for &x in data {
        let idx = (((x - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    Some(out)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn welford_matches_two_pass(data in proptest::collection::vec(-1e3_f64..1e3, 2..200)) {
            let m = data.iter().sum::<f64>() / data.len() as f64;
            let two_pass = data.iter().map(|x| (x - m).powi(2)).sum::<f64>()
                / (data.len() - 1) as f64;
            let v = variance(&data).unwrap();
            prop_assert!((v - two_pass).abs() <= 1e-9 * two_pass.max(1.0));
        }

        #[test]
        fn mean_within_range(data in proptest::collection::vec(-1e6_f64..1e6, 1..200)) {
            let m = mean(&data).unwrap();
            prop_assert!(m >= min(&data).unwrap() - 1e-6);
            prop_assert!(m <= max(&data).unwrap() + 1e-6);
        }

        #[test]
        fn histogram_conserves_count(
            data in proptest::collection::vec(-50.0_f64..50.0, 1..300),
            bins in 1_usize..40,
        ) {
            let h = histogram(&data, bins).unwrap();
            prop_assert_eq!(h.len(), bins);
            prop_assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), data.len());
        }
    }
}

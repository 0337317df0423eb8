//! Two-sided Student-t confidence intervals for a population mean.
//!
//! For a sample `x₁ … xₙ` and confidence level `1 − α` the interval is
//!
//! ```text
//! x̄ ± t_{1−α/2, n−1} · s / √n
//! ```
//!
//! where `s` is the sample standard deviation with Bessel's correction.

use crate::error::{Result, SimulationError};
use crate::special;
use crate::stats;

/// A confidence level strictly inside `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ConfidenceLevel(f64);

impl ConfidenceLevel {
    /// Validates `level`.
    ///
    /// # Errors
    /// [`SimulationError::InvalidConfidenceLevel`] unless `0 < level < 1`
    /// (NaN is rejected).
    pub fn new(level: f64) -> Result<Self> {
        if level > 0.0 && level < 1.0 {
            Ok(Self(level))
        } else {
            Err(SimulationError::InvalidConfidenceLevel { level })
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// `α = 1 − level`.
    pub fn alpha(self) -> f64 {
        1.0 - self.0
    }

    /// Two-sided critical value `t_{1−α/2, df}`.
    ///
    /// Solved from the upper tail `α/2`, which stays exact for levels
    /// within an ulp of 1.
    pub fn t_critical_value(self, df: f64) -> f64 {
        special::t_distribution_upper_quantile(self.alpha() / 2.0, df)
    }
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = SimulationError;

    fn try_from(level: f64) -> Result<Self> {
        Self::new(level)
    }
}

/// A closed interval `[lower, upper]` with `lower ≤ upper`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    /// `upper − lower`, never negative.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// `true` when `lower < value < upper`. Coverage counts a hit only
    /// when the true mean lies strictly inside the interval.
    pub fn contains_strictly(&self, value: f64) -> bool {
        self.lower < value && value < self.upper
    }
}

/// Computes the two-sided t-interval for the mean of `sample`.
///
/// # Errors
/// - [`SimulationError::InvalidSampleSize`] if `sample.len() < 2`.
/// - [`SimulationError::NoSample`] if the sample holds NaN or infinite
///   values, which leave the mean undefined.
///
/// # Examples
/// ```
/// use ci_coverage::interval::{t_interval, ConfidenceLevel};
/// let level = ConfidenceLevel::new(0.95).unwrap();
/// // x̄ = 2, s = 1, n = 3, t(0.975; 2) = 4.3027
/// let ci = t_interval(&[1.0, 2.0, 3.0], level).unwrap();
/// assert!((ci.lower + ci.upper - 4.0).abs() < 1e-12);
/// assert!((ci.upper - (2.0 + 4.302652729749464 / 3.0_f64.sqrt())).abs() < 1e-9);
/// ```
pub fn t_interval(sample: &[f64], level: ConfidenceLevel) -> Result<Interval> {
    let n = sample.len();
    if n < 2 {
        return Err(SimulationError::InvalidSampleSize { n });
    }
    let (Some(xbar), Some(s)) = (stats::mean(sample), stats::std_dev(sample)) else {
        return Err(SimulationError::NoSample);
    };

    let t_cv = level.t_critical_value((n - 1) as f64);
    let margin = t_cv * s / (n as f64).sqrt();
    Ok(Interval {
        lower: xbar - margin,
        upper: xbar + margin,
    })
}

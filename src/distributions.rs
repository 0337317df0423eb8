//! Distribution registry.
//!
//! Maps a distribution identifier to a sampler and the distribution's
//! exact mean, which serves as ground truth when checking coverage.
//!
//! # Supported Distributions
//!
//! | Identifier | Distribution | True mean |
//! |---|---|---|
//! | `norm` | standard normal N(0, 1) | 0 |
//! | `uniform` | standard uniform on `[0, 1)` | 0.5 |
//! | `expon` | standard exponential (rate 1) | 1 |
//! | `t` | Student's t, 10 degrees of freedom | 0 |
//!
//! The table is fixed at compile time; looking up any other identifier
//! fails with [`SimulationError::UnsupportedDistribution`].

use std::fmt;
use std::str::FromStr;

use rand::distr::StandardUniform;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Exp1, StandardNormal, StudentT};

use crate::error::{Result, SimulationError};

/// Degrees of freedom of the registered Student-t distribution.
pub const T_DEGREES_OF_FREEDOM: f64 = 10.0;

/// Identifier of a registered distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionId {
    Norm,
    Uniform,
    Expon,
    T,
}

impl DistributionId {
    pub const ALL: [DistributionId; 4] = [Self::Norm, Self::Uniform, Self::Expon, Self::T];

    /// The identifier string accepted by [`lookup`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Norm => "norm",
            Self::Uniform => "uniform",
            Self::Expon => "expon",
            Self::T => "t",
        }
    }

    /// The registry entry for this identifier.
    pub fn spec(self) -> &'static DistributionSpec {
        &REGISTRY[self as usize]
    }
}

impl fmt::Display for DistributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionId {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| SimulationError::UnsupportedDistribution { id: s.to_string() })
    }
}

/// Capability shared by every registry entry: draw samples and report the
/// exact population mean.
pub trait Sampler {
    /// Clears `out` and fills it with `n` independent draws.
    ///
    /// # Errors
    /// [`SimulationError::UnsupportedDistribution`] if the parameters do not
    /// describe a valid distribution. `out` is left unchanged in that case.
    fn sample_into(&self, n: usize, rng: &mut dyn RngCore, out: &mut Vec<f64>) -> Result<()>;

    /// The distribution's exact mean.
    fn true_mean(&self) -> f64;

    /// Returns `n` independent draws in a fresh vector.
    fn sample(&self, n: usize, rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(n);
        self.sample_into(n, rng, &mut out)?;
        Ok(out)
    }
}

/// The parametric family behind a registry entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Family {
    StandardNormal,
    StandardUniform,
    StandardExponential,
    StudentT { df: f64 },
}

/// A registry entry: identifier plus the family it samples from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionSpec {
    id: DistributionId,
    family: Family,
}

/// Indexed by `DistributionId as usize`.
static REGISTRY: [DistributionSpec; 4] = [
    DistributionSpec {
        id: DistributionId::Norm,
        family: Family::StandardNormal,
    },
    DistributionSpec {
        id: DistributionId::Uniform,
        family: Family::StandardUniform,
    },
    DistributionSpec {
        id: DistributionId::Expon,
        family: Family::StandardExponential,
    },
    DistributionSpec {
        id: DistributionId::T,
        family: Family::StudentT {
            df: T_DEGREES_OF_FREEDOM,
        },
    },
];

impl DistributionSpec {
    pub fn id(&self) -> DistributionId {
        self.id
    }

    pub fn family(&self) -> Family {
        self.family
    }
}

fn refill(out: &mut Vec<f64>, n: usize, draw: impl FnMut() -> f64) {
    out.clear();
    out.reserve(n);
    out.extend(std::iter::repeat_with(draw).take(n));
}

impl Sampler for DistributionSpec {
    fn sample_into(&self, n: usize, rng: &mut dyn RngCore, out: &mut Vec<f64>) -> Result<()> {
        match self.family {
            Family::StandardNormal => refill(out, n, || rng.sample::<f64, _>(StandardNormal)),
            Family::StandardUniform => refill(out, n, || rng.sample::<f64, _>(StandardUniform)),
            Family::StandardExponential => refill(out, n, || rng.sample::<f64, _>(Exp1)),
            Family::StudentT { df } => {
                let dist = StudentT::new(df).map_err(|_| {
                    SimulationError::UnsupportedDistribution {
                        id: format!("{}({df})", self.id),
                    }
                })?;
                refill(out, n, || dist.sample(rng));
            }
        }
        Ok(())
    }

    fn true_mean(&self) -> f64 {
        match self.family {
            Family::StandardNormal => 0.0,
            Family::StandardUniform => 0.5,
            Family::StandardExponential => 1.0,
            // Undefined for df ≤ 1 (Cauchy-like tails).
            Family::StudentT { df } if df > 1.0 => 0.0,
            Family::StudentT { .. } => f64::NAN,
        }
    }
}

/// Resolves an identifier to its registry entry.
///
/// # Errors
/// [`SimulationError::UnsupportedDistribution`] for unknown identifiers.
///
/// # Examples
/// ```
/// use ci_coverage::distributions::{lookup, Sampler};
/// assert_eq!(lookup("expon").unwrap().true_mean(), 1.0);
/// assert!(lookup("cauchy").is_err());
/// ```
pub fn lookup(id: &str) -> Result<&'static DistributionSpec> {
    id.parse::<DistributionId>().map(DistributionId::spec)
}

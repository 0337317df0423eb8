//! Simulation parameters and their validation.
//!
//! A run is described by four values (distribution, sample size,
//! confidence level, repetitions) plus an optional RNG seed. All checks
//! happen here, before any sampling, so a misconfigured run fails without
//! doing work.

use rand::rngs::SmallRng;

use crate::distributions::{self, DistributionSpec};
use crate::error::{Result, SimulationError};
use crate::interval::ConfidenceLevel;
use crate::random;
use crate::simulation::Simulation;

/// User-facing description of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub distribution: String,
    pub n: usize,
    pub confidence_level: f64,
    pub num_sims: usize,
    /// Seed for a reproducible run; `None` draws one from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    /// 10 000 repetitions of a 95% interval on samples of 100 standard
    /// normal draws.
    fn default() -> Self {
        Self {
            distribution: "norm".to_string(),
            n: 100,
            confidence_level: 0.95,
            num_sims: 10_000,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn new(
        distribution: impl Into<String>,
        n: usize,
        confidence_level: f64,
        num_sims: usize,
    ) -> Self {
        Self {
            distribution: distribution.into(),
            n,
            confidence_level,
            num_sims,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration into ready-to-run parameters.
    pub fn parameters(&self) -> Result<RunParameters> {
        RunParameters::new(
            &self.distribution,
            self.n,
            self.confidence_level,
            self.num_sims,
        )
    }

    /// Builds a simulation whose RNG honours [`Self::seed`].
    pub fn build_simulation(&self) -> Simulation<SmallRng> {
        match self.seed {
            Some(seed) => Simulation::with_rng(random::create_rng(seed)),
            None => Simulation::with_rng(random::entropy_rng()),
        }
    }
}

/// Validated run parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParameters {
    pub spec: &'static DistributionSpec,
    pub n: usize,
    pub level: ConfidenceLevel,
    pub num_sims: usize,
}

impl RunParameters {
    /// Checks, in order: distribution identifier, sample size, confidence
    /// level, repetition count. The first failure is returned.
    ///
    /// # Examples
    /// ```
    /// use ci_coverage::config::RunParameters;
    /// use ci_coverage::SimulationError;
    /// assert!(RunParameters::new("norm", 100, 0.95, 10).is_ok());
    /// assert_eq!(
    ///     RunParameters::new("norm", 1, 0.95, 10).unwrap_err(),
    ///     SimulationError::InvalidSampleSize { n: 1 },
    /// );
    /// ```
    pub fn new(distribution: &str, n: usize, confidence_level: f64, num_sims: usize) -> Result<Self> {
        let spec = distributions::lookup(distribution)?;
        if n < 2 {
            return Err(SimulationError::InvalidSampleSize { n });
        }
        let level = ConfidenceLevel::new(confidence_level)?;
        if num_sims == 0 {
            return Err(SimulationError::InvalidIterationCount { num_sims });
        }
        Ok(Self {
            spec,
            n,
            level,
            num_sims,
        })
    }
}

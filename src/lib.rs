//! # ci-coverage
//!
//! Monte Carlo estimation of the coverage probability of the classical
//! Student-t confidence interval for a mean.
//!
//! A run repeatedly draws a sample of size `n` from a known distribution,
//! builds a two-sided t-interval at the requested confidence level, and
//! records whether the interval contains the distribution's true mean.
//! The fraction of intervals that do is the empirical coverage; the
//! interval widths are kept for reporting.
//!
//! ## Modules
//!
//! - [`distributions`] — Registry of the supported distributions and their true means
//! - [`simulation`] — Sample generation, the repetition loop, accumulated results
//! - [`interval`] — t-interval estimator and confidence-level validation
//! - [`config`] — Run parameters and their validation
//! - [`special`] — Student-t quantile and the special functions behind it
//! - [`stats`] — Descriptive statistics and histogram binning
//! - [`random`] — Seeded and entropy-seeded RNG construction
//! - [`error`] — Error taxonomy
//!
//! ## Example
//!
//! ```
//! use ci_coverage::Simulation;
//!
//! let mut sim = Simulation::with_seed(7);
//! let coverage = sim.run("norm", 100, 0.95, 2_000).unwrap();
//! assert!((coverage - 0.95).abs() < 0.03);
//! assert_eq!(sim.widths_report().len(), 2_000);
//! ```
//!
//! ## Design Philosophy
//!
//! - **Fail fast**: every parameter is validated before sampling starts;
//!   unknown distributions are errors, never silent no-ops
//! - **Numerical stability**: compensated summation and Welford variance
//! - **Reproducibility**: any run can be replayed from a seed
//! - **Property-based testing**: interval and coverage invariants verified via proptest

pub mod config;
pub mod distributions;
pub mod error;
pub mod interval;
pub mod random;
pub mod simulation;
pub mod special;
pub mod stats;

pub use config::{RunParameters, SimulationConfig};
pub use distributions::{DistributionId, Sampler};
pub use error::{Result, SimulationError};
pub use interval::{ConfidenceLevel, Interval};
pub use simulation::{
    new_simulation, AccumulatedResults, Simulation, SimulationReport, WidthSummary,
};

//! Error taxonomy for coverage simulations.
//!
//! Every variant is an input-validation failure raised synchronously at the
//! offending call and carries the value that was rejected.

/// Errors produced while generating samples, estimating intervals, or
/// driving a simulation run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("unsupported distribution '{id}': expected one of norm, uniform, expon, t")]
    UnsupportedDistribution { id: String },

    #[error("invalid sample size {n}: a t-interval needs n > 1")]
    InvalidSampleSize { n: usize },

    #[error("invalid confidence level {level}: must lie strictly between 0 and 1")]
    InvalidConfidenceLevel { level: f64 },

    /// The estimator was called before any sample was generated, or the
    /// current sample holds non-finite values.
    #[error("no usable sample: call generate before estimating an interval")]
    NoSample,

    #[error("invalid iteration count {num_sims}: at least one repetition is required")]
    InvalidIterationCount { num_sims: usize },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimulationError>;

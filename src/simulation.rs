//! Sample generation and the coverage simulation loop.
//!
//! A [`Simulation`] owns its RNG, the current sample (the *simulation
//! state*) and the results of its most recent completed run. Each
//! repetition of a run overwrites the state with a fresh sample, builds a
//! t-interval from it and appends the bounds, width and true mean to an
//! [`AccumulatedResults`]. Coverage is computed once the loop finishes.
//!
//! # Examples
//! ```
//! use ci_coverage::Simulation;
//! let mut sim = Simulation::with_seed(42);
//! let coverage = sim.run("uniform", 30, 0.9, 500).unwrap();
//! assert!((0.0..=1.0).contains(&coverage));
//! assert_eq!(sim.widths_report().len(), 500);
//! ```

use rand::rngs::SmallRng;
use rand::RngCore;
use tracing::{debug, info, trace};

use crate::config::RunParameters;
use crate::distributions::{self, Sampler};
use crate::error::{Result, SimulationError};
use crate::interval::{self, ConfidenceLevel, Interval};
use crate::random;
use crate::stats::{self, HistogramBin};

/// The sample drawn by the latest call to [`Simulation::generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    sample: Vec<f64>,
    true_mean: f64,
}

impl SimulationState {
    pub fn sample(&self) -> &[f64] {
        &self.sample
    }

    pub fn true_mean(&self) -> f64 {
        self.true_mean
    }
}

/// Per-repetition interval bounds, widths and true means.
///
/// All four sequences always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatedResults {
    lower_bounds: Vec<f64>,
    upper_bounds: Vec<f64>,
    widths: Vec<f64>,
    true_means: Vec<f64>,
}

impl AccumulatedResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lower_bounds: Vec::with_capacity(capacity),
            upper_bounds: Vec::with_capacity(capacity),
            widths: Vec::with_capacity(capacity),
            true_means: Vec::with_capacity(capacity),
        }
    }

    /// Records one repetition.
    pub fn push(&mut self, interval: Interval, true_mean: f64) {
        self.lower_bounds.push(interval.lower);
        self.upper_bounds.push(interval.upper);
        self.widths.push(interval.width());
        self.true_means.push(true_mean);
    }

    /// Appends every repetition of `other`, e.g. when combining the output
    /// of independent workers. Coverage is recomputed from the merged lists.
    pub fn merge(&mut self, other: AccumulatedResults) {
        self.lower_bounds.extend(other.lower_bounds);
        self.upper_bounds.extend(other.upper_bounds);
        self.widths.extend(other.widths);
        self.true_means.extend(other.true_means);
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    pub fn lower_bounds(&self) -> &[f64] {
        &self.lower_bounds
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper_bounds
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub fn true_means(&self) -> &[f64] {
        &self.true_means
    }

    /// Number of repetitions whose own true mean lies strictly inside
    /// their interval.
    pub fn hits(&self) -> usize {
        self.lower_bounds
            .iter()
            .zip(&self.upper_bounds)
            .zip(&self.true_means)
            .filter(|&((&lower, &upper), &mu)| Interval { lower, upper }.contains_strictly(mu))
            .count()
    }

    /// Fraction of repetitions that covered the true mean, or `None` when
    /// nothing has been recorded.
    pub fn coverage(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.hits() as f64 / self.len() as f64)
    }

    /// Equal-width histogram of the interval widths.
    pub fn width_histogram(&self, bins: usize) -> Option<Vec<HistogramBin>> {
        stats::histogram(&self.widths, bins)
    }

    pub fn width_summary(&self) -> Option<WidthSummary> {
        WidthSummary::from_widths(&self.widths)
    }
}

/// Descriptive statistics of the interval widths of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// `None` for a single repetition.
    pub std_dev: Option<f64>,
}

impl WidthSummary {
    /// Returns `None` for an empty or non-finite set of widths.
    pub fn from_widths(widths: &[f64]) -> Option<Self> {
        Some(Self {
            count: widths.len(),
            min: stats::min(widths)?,
            max: stats::max(widths)?,
            mean: stats::mean(widths)?,
            median: stats::median(widths)?,
            std_dev: stats::std_dev(widths),
        })
    }
}

/// Outcome of one completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub coverage: f64,
    pub results: AccumulatedResults,
}

/// Coverage simulation driver.
///
/// Generic over the RNG so tests and callers can supply their own; the
/// default is a [`SmallRng`].
#[derive(Debug)]
pub struct Simulation<R = SmallRng> {
    rng: R,
    state: Option<SimulationState>,
    last_run: Option<SimulationReport>,
}

/// Creates an empty simulation seeded from OS entropy.
pub fn new_simulation() -> Simulation {
    Simulation::new()
}

impl Simulation<SmallRng> {
    /// Empty simulation seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(random::entropy_rng())
    }

    /// Empty simulation with a reproducible RNG stream.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(random::create_rng(seed))
    }
}

impl Default for Simulation<SmallRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> Simulation<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            state: None,
            last_run: None,
        }
    }

    /// Draws a fresh sample of size `n` from `distribution` and makes it the
    /// current state, replacing any previous sample.
    ///
    /// # Errors
    /// - [`SimulationError::UnsupportedDistribution`] for an unknown identifier.
    /// - [`SimulationError::InvalidSampleSize`] if `n < 2`.
    ///
    /// On error the previous state is left untouched.
    pub fn generate(&mut self, distribution: &str, n: usize) -> Result<()> {
        let spec = distributions::lookup(distribution)?;
        self.generate_from(spec, n)
    }

    fn generate_from(&mut self, sampler: &dyn Sampler, n: usize) -> Result<()> {
        if n < 2 {
            return Err(SimulationError::InvalidSampleSize { n });
        }
        if let Some(state) = self.state.as_mut() {
            sampler.sample_into(n, &mut self.rng, &mut state.sample)?;
            state.true_mean = sampler.true_mean();
            return Ok(());
        }
        let sample = sampler.sample(n, &mut self.rng)?;
        self.state = Some(SimulationState {
            sample,
            true_mean: sampler.true_mean(),
        });
        Ok(())
    }

    /// Builds the t-interval for the current sample.
    ///
    /// # Errors
    /// - [`SimulationError::InvalidConfidenceLevel`] unless `0 < level < 1`.
    /// - [`SimulationError::NoSample`] if [`Self::generate`] has not run yet.
    pub fn estimate(&self, confidence_level: f64) -> Result<Interval> {
        let level = ConfidenceLevel::new(confidence_level)?;
        self.estimate_at(level)
    }

    fn estimate_at(&self, level: ConfidenceLevel) -> Result<Interval> {
        let state = self.state.as_ref().ok_or(SimulationError::NoSample)?;
        interval::t_interval(&state.sample, level)
    }

    /// Runs `num_sims` repetitions and returns the empirical coverage.
    ///
    /// The run's results replace those of any earlier run and stay
    /// available through [`Self::widths_report`] and friends. A failed run
    /// leaves earlier results in place.
    ///
    /// # Errors
    /// Any validation failure of the four parameters (see
    /// [`RunParameters::new`]).
    pub fn run(
        &mut self,
        distribution: &str,
        n: usize,
        confidence_level: f64,
        num_sims: usize,
    ) -> Result<f64> {
        let report = self.run_report(distribution, n, confidence_level, num_sims)?;
        let coverage = report.coverage;
        self.last_run = Some(report);
        Ok(coverage)
    }

    /// Like [`Self::run`] but hands the full report to the caller instead
    /// of storing it.
    pub fn run_report(
        &mut self,
        distribution: &str,
        n: usize,
        confidence_level: f64,
        num_sims: usize,
    ) -> Result<SimulationReport> {
        let params = RunParameters::new(distribution, n, confidence_level, num_sims)?;
        self.execute(&params)
    }

    /// Executes the simulation loop for already validated parameters.
    pub fn execute(&mut self, params: &RunParameters) -> Result<SimulationReport> {
        if params.num_sims == 0 {
            return Err(SimulationError::InvalidIterationCount { num_sims: 0 });
        }
        info!(
            distribution = %params.spec.id(),
            n = params.n,
            confidence_level = params.level.value(),
            num_sims = params.num_sims,
            "starting coverage simulation"
        );

        let mut results = AccumulatedResults::with_capacity(params.num_sims);
        for rep in 0..params.num_sims {
            self.generate_from(params.spec, params.n)?;
            let ci = self.estimate_at(params.level)?;
            let true_mean = self.state.as_ref().map_or(f64::NAN, |s| s.true_mean);
            trace!(rep, lower = ci.lower, upper = ci.upper, "repetition complete");
            results.push(ci, true_mean);
        }

        let coverage = results
            .coverage()
            .ok_or(SimulationError::InvalidIterationCount { num_sims: 0 })?;
        debug!(hits = results.hits(), total = results.len(), "coverage tallied");
        info!(coverage, "coverage simulation finished");

        Ok(SimulationReport { coverage, results })
    }

    /// The current sample, if any.
    pub fn current_state(&self) -> Option<&SimulationState> {
        self.state.as_ref()
    }

    /// Results of the latest completed [`Self::run`].
    pub fn results(&self) -> Option<&AccumulatedResults> {
        self.last_run.as_ref().map(|r| &r.results)
    }

    /// Coverage of the latest completed [`Self::run`]; `None` before one
    /// has finished.
    pub fn coverage(&self) -> Option<f64> {
        self.last_run.as_ref().map(|r| r.coverage)
    }

    /// Interval widths of the latest completed [`Self::run`], for plotting.
    /// Empty before any run has finished.
    pub fn widths_report(&self) -> &[f64] {
        self.results()
            .map(AccumulatedResults::widths)
            .unwrap_or_default()
    }

    pub fn lower_bounds(&self) -> &[f64] {
        self.results()
            .map(AccumulatedResults::lower_bounds)
            .unwrap_or_default()
    }

    pub fn upper_bounds(&self) -> &[f64] {
        self.results()
            .map(AccumulatedResults::upper_bounds)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::DistributionId;

    #[test]
    fn test_new_simulation_is_empty() {
        let sim = new_simulation();
        assert!(sim.current_state().is_none());
        assert!(sim.coverage().is_none());
        assert!(sim.widths_report().is_empty());
        assert!(sim.lower_bounds().is_empty());
        assert!(sim.upper_bounds().is_empty());
    }

    #[test]
    fn test_generate_sets_state() {
        let mut sim = Simulation::with_seed(1);
        for id in DistributionId::ALL {
            sim.generate(id.as_str(), 25).unwrap();
            let state = sim.current_state().unwrap();
            assert_eq!(state.sample().len(), 25);
            assert_eq!(state.true_mean(), id.spec().true_mean());
        }
    }

    #[test]
    fn test_generate_overwrites_previous_sample() {
        let mut sim = Simulation::with_seed(2);
        sim.generate("norm", 40).unwrap();
        let first = sim.current_state().unwrap().clone();
        sim.generate("expon", 12).unwrap();
        let second = sim.current_state().unwrap();
        assert_eq!(second.sample().len(), 12);
        assert_eq!(second.true_mean(), 1.0);
        assert_ne!(&first, second);
    }

    #[test]
    fn test_generate_errors_leave_state_alone() {
        let mut sim = Simulation::with_seed(3);
        sim.generate("uniform", 10).unwrap();
        let before = sim.current_state().unwrap().clone();

        assert_eq!(
            sim.generate("bogus", 10),
            Err(SimulationError::UnsupportedDistribution {
                id: "bogus".to_string()
            })
        );
        assert_eq!(
            sim.generate("norm", 1),
            Err(SimulationError::InvalidSampleSize { n: 1 })
        );
        assert_eq!(sim.current_state(), Some(&before));
    }

    #[test]
    fn test_estimate_without_sample() {
        let sim = Simulation::with_seed(4);
        assert_eq!(sim.estimate(0.95), Err(SimulationError::NoSample));
    }

    #[test]
    fn test_estimate_rejects_bad_level() {
        let mut sim = Simulation::with_seed(5);
        sim.generate("norm", 10).unwrap();
        assert_eq!(
            sim.estimate(1.0),
            Err(SimulationError::InvalidConfidenceLevel { level: 1.0 })
        );
        assert_eq!(
            sim.estimate(0.0),
            Err(SimulationError::InvalidConfidenceLevel { level: 0.0 })
        );
    }

    #[test]
    fn test_estimate_at_level_within_an_ulp_of_one() {
        let level = 1.0 - f64::EPSILON / 2.0;
        let mut sim = Simulation::with_seed(5);
        sim.generate("norm", 10).unwrap();
        let ci = sim.estimate(level).unwrap();
        assert!(ci.lower.is_finite() && ci.upper.is_finite(), "{ci:?}");
        assert!(ci.lower <= ci.upper);

        let coverage = sim.run("norm", 10, level, 5).unwrap();
        assert_eq!(coverage, 1.0);
        assert!(sim.widths_report().iter().all(|w| w.is_finite() && *w > 0.0));
    }

    #[test]
    fn test_estimate_at_tiny_level() {
        let mut sim = Simulation::with_seed(5);
        sim.generate("expon", 10).unwrap();
        let ci = sim.estimate(1e-300).unwrap();
        assert!(ci.lower.is_finite() && ci.lower <= ci.upper);
        assert!(ci.width() >= 0.0);
    }

    struct BrokenSampler;

    impl Sampler for BrokenSampler {
        fn sample_into(&self, _: usize, _: &mut dyn RngCore, _: &mut Vec<f64>) -> Result<()> {
            Err(SimulationError::UnsupportedDistribution {
                id: "broken".to_string(),
            })
        }

        fn true_mean(&self) -> f64 {
            f64::NAN
        }
    }

    #[test]
    fn test_sampler_failure_leaves_state_alone() {
        let mut sim = Simulation::with_seed(5);
        assert!(sim.generate_from(&BrokenSampler, 10).is_err());
        assert!(sim.current_state().is_none());

        sim.generate("uniform", 10).unwrap();
        let before = sim.current_state().unwrap().clone();
        assert!(sim.generate_from(&BrokenSampler, 10).is_err());
        assert_eq!(sim.current_state(), Some(&before));
    }

    #[test]
    fn test_estimate_idempotent_on_same_state() {
        let mut sim = Simulation::with_seed(6);
        sim.generate("t", 30).unwrap();
        assert_eq!(sim.estimate(0.9).unwrap(), sim.estimate(0.9).unwrap());
    }

    #[test]
    fn test_run_error_cases() {
        let mut sim = Simulation::with_seed(7);
        assert_eq!(
            sim.run("bogus", 100, 0.95, 10),
            Err(SimulationError::UnsupportedDistribution {
                id: "bogus".to_string()
            })
        );
        assert_eq!(
            sim.run("norm", 1, 0.95, 10),
            Err(SimulationError::InvalidSampleSize { n: 1 })
        );
        assert_eq!(
            sim.run("norm", 100, 1.5, 10),
            Err(SimulationError::InvalidConfidenceLevel { level: 1.5 })
        );
        assert_eq!(
            sim.run("norm", 100, 0.95, 0),
            Err(SimulationError::InvalidIterationCount { num_sims: 0 })
        );
        assert!(sim.widths_report().is_empty());
        assert!(sim.coverage().is_none());
    }

    #[test]
    fn test_run_accumulates_one_entry_per_repetition() {
        let mut sim = Simulation::with_seed(8);
        let coverage = sim.run("expon", 20, 0.8, 137).unwrap();
        assert_eq!(sim.coverage(), Some(coverage));

        let results = sim.results().unwrap();
        assert_eq!(results.len(), 137);
        assert_eq!(results.lower_bounds().len(), 137);
        assert_eq!(results.upper_bounds().len(), 137);
        assert_eq!(results.true_means().len(), 137);
        assert_eq!(sim.widths_report().len(), 137);
        assert!(sim.widths_report().iter().all(|&w| w >= 0.0));

        for ((lo, hi), w) in sim
            .lower_bounds()
            .iter()
            .zip(sim.upper_bounds())
            .zip(sim.widths_report())
        {
            assert_eq!(hi - lo, *w);
        }
    }

    #[test]
    fn test_repeated_runs_are_independent() {
        let mut sim = Simulation::with_seed(9);
        sim.run("norm", 10, 0.95, 50).unwrap();
        sim.run("uniform", 10, 0.95, 20).unwrap();
        assert_eq!(sim.widths_report().len(), 20);
        assert!(sim.results().unwrap().true_means().iter().all(|&m| m == 0.5));
    }

    #[test]
    fn test_failed_run_keeps_previous_results() {
        let mut sim = Simulation::with_seed(10);
        let coverage = sim.run("norm", 10, 0.95, 30).unwrap();
        assert!(sim.run("norm", 10, 0.95, 0).is_err());
        assert_eq!(sim.coverage(), Some(coverage));
        assert_eq!(sim.widths_report().len(), 30);
    }

    #[test]
    fn test_run_report_does_not_store() {
        let mut sim = Simulation::with_seed(11);
        let report = sim.run_report("t", 15, 0.9, 40).unwrap();
        assert_eq!(report.results.len(), 40);
        assert_eq!(report.results.coverage(), Some(report.coverage));
        assert!(sim.coverage().is_none());
    }

    #[test]
    fn test_seeded_runs_reproducible() {
        let a = Simulation::with_seed(12).run_report("norm", 25, 0.95, 200).unwrap();
        let b = Simulation::with_seed(12).run_report("norm", 25, 0.95, 200).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_coverage_near_nominal_for_normal() {
        for seed in [100, 200, 300] {
            let coverage = Simulation::with_seed(seed)
                .run("norm", 100, 0.95, 10_000)
                .unwrap();
            assert!(
                (coverage - 0.95).abs() < 0.02,
                "seed {seed}: coverage {coverage}"
            );
        }
    }

    #[test]
    fn test_coverage_exact_for_tiny_normal_samples() {
        // With n = 2 the t critical value is 12.7; a z-interval would cover
        // only about 70% of the time.
        let coverage = Simulation::with_seed(13).run("norm", 2, 0.95, 20_000).unwrap();
        assert!((coverage - 0.95).abs() < 0.02, "coverage {coverage}");
    }

    #[test]
    fn test_coverage_other_distributions() {
        let mut sim = Simulation::with_seed(14);
        for (id, lo, hi) in [("uniform", 0.93, 0.97), ("t", 0.93, 0.97), ("expon", 0.90, 0.97)] {
            let coverage = sim.run(id, 100, 0.95, 4_000).unwrap();
            assert!((lo..=hi).contains(&coverage), "{id}: coverage {coverage}");
        }
    }

    #[test]
    fn test_hits_compare_per_repetition_true_mean() {
        let mut results = AccumulatedResults::new();
        let ci = Interval {
            lower: 0.2,
            upper: 0.8,
        };
        results.push(ci, 0.5);
        results.push(ci, 1.0);
        results.push(ci, 0.8);
        assert_eq!(results.hits(), 1);
        assert!((results.coverage().unwrap() - 1.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_merge_recomputes_coverage() {
        let a = Simulation::with_seed(15).run_report("norm", 10, 0.9, 300).unwrap();
        let b = Simulation::with_seed(16).run_report("expon", 10, 0.9, 200).unwrap();
        let expected = (a.results.hits() + b.results.hits()) as f64 / 500.0;

        let mut merged = a.results.clone();
        merged.merge(b.results.clone());
        assert_eq!(merged.len(), 500);
        assert_eq!(&merged.widths()[..300], a.results.widths());
        assert_eq!(&merged.widths()[300..], b.results.widths());
        assert!((merged.coverage().unwrap() - expected).abs() < 1e-15);
    }

    #[test]
    fn test_empty_results_have_no_coverage() {
        let results = AccumulatedResults::new();
        assert!(results.is_empty());
        assert_eq!(results.coverage(), None);
        assert!(results.width_summary().is_none());
        assert!(results.width_histogram(10).is_none());
    }

    #[test]
    fn test_width_summary() {
        let mut sim = Simulation::with_seed(17);
        sim.run("norm", 50, 0.95, 400).unwrap();
        let summary = sim.results().unwrap().width_summary().unwrap();
        assert_eq!(summary.count, 400);
        assert!(summary.min <= summary.median && summary.median <= summary.max);
        assert!(summary.min <= summary.mean && summary.mean <= summary.max);
        // E[width] ≈ 2 · t(0.975; 49) / √50 ≈ 0.568
        assert!((summary.mean - 0.568).abs() < 0.03, "mean width {}", summary.mean);
        assert!(summary.std_dev.unwrap() > 0.0);
    }

    #[test]
    fn test_width_histogram_counts_every_run() {
        let mut sim = Simulation::with_seed(18);
        sim.run("uniform", 20, 0.95, 250).unwrap();
        let bins = sim.results().unwrap().width_histogram(30).unwrap();
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 250);
    }

    #[test]
    fn test_execute_with_custom_rng() {
        let params = RunParameters::new("norm", 5, 0.5, 10).unwrap();
        let mut sim = Simulation::with_rng(random::create_rng(19));
        let report = sim.execute(&params).unwrap();
        assert_eq!(report.results.len(), 10);
    }
}

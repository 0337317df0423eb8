use std::fmt;
use std::sync::Once;

use clap::Parser;
use tracing_subscriber::{fmt as log_fmt, prelude::*, EnvFilter};

use ci_coverage::stats::HistogramBin;
use ci_coverage::{SimulationConfig, SimulationReport};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "CI_SIM_LOG";

static INIT: Once = Once::new();

#[derive(Debug, Parser)]
#[command(
    name = "ci-sim",
    about = "Estimate the coverage of Student-t confidence intervals by simulation",
    version
)]
pub struct Cli {
    /// Distribution to sample from: norm, uniform, expon or t (10 df)
    #[arg(short = 'd', long = "distribution", default_value = "norm")]
    pub distribution: String,

    /// Observations per simulated sample (must exceed 1)
    #[arg(short = 'n', long = "sample-size", default_value_t = 100)]
    pub sample_size: usize,

    /// Confidence level strictly between 0 and 1
    #[arg(short = 'c', long = "confidence", default_value_t = 0.95)]
    pub confidence: f64,

    /// Number of simulated intervals
    #[arg(short = 's', long = "sims", default_value_t = 10_000)]
    pub sims: usize,

    /// Seed for a reproducible run
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Histogram bins for the width report
    #[arg(long = "bins", default_value_t = 30)]
    pub bins: usize,

    /// Skip the width histogram
    #[arg(long = "no-histogram")]
    pub no_histogram: bool,
}

impl Cli {
    pub fn config(&self) -> SimulationConfig {
        let cfg = SimulationConfig::new(
            self.distribution.clone(),
            self.sample_size,
            self.confidence,
            self.sims,
        );
        match self.seed {
            Some(seed) => cfg.with_seed(seed),
            None => cfg,
        }
    }
}

/// Installs the stderr log subscriber. Safe to call more than once.
///
/// Reads `CI_SIM_LOG` for filter directives, e.g.
/// `CI_SIM_LOG=ci_coverage=debug`; falls back to `ci_coverage=info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("ci_coverage=info"));

        tracing_subscriber::registry()
            .with(log_fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}

/// Coverage line and width summary of a report.
pub struct Summary<'a> {
    pub config: &'a SimulationConfig,
    pub report: &'a SimulationReport,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (cfg, results) = (self.config, &self.report.results);
        writeln!(
            f,
            "distribution={} n={} confidence={} sims={}",
            cfg.distribution, cfg.n, cfg.confidence_level, cfg.num_sims
        )?;
        writeln!(
            f,
            "coverage: {:.4} ({} of {} intervals contain the true mean)",
            self.report.coverage,
            results.hits(),
            results.len()
        )?;
        if let Some(s) = results.width_summary() {
            write!(f, "width: mean {:.4}  median {:.4}  sd ", s.mean, s.median)?;
            match s.std_dev {
                Some(sd) => write!(f, "{sd:.4}")?,
                None => f.write_str("-")?,
            }
            writeln!(f, "  min {:.4}  max {:.4}", s.min, s.max)?;
        }
        Ok(())
    }
}

/// Horizontal bar chart of histogram bins, longest bar `width` characters.
pub struct WidthHistogram<'a> {
    pub bins: &'a [HistogramBin],
    pub width: usize,
}

impl fmt::Display for WidthHistogram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let peak = self.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        for b in self.bins {
            let bar = b.count * self.width / peak;
            writeln!(
                f,
                "[{:>9.4}, {:>9.4}) {:>7} {}",
                b.lower,
                b.upper,
                b.count,
                "#".repeat(bar)
            )?;
        }
        Ok(())
    }
}

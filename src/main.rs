mod cli;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::{Cli, Summary, WidthHistogram};

/// Width of the longest histogram bar, in characters.
const BAR_WIDTH: usize = 50;

fn main() -> ExitCode {
    cli::init_tracing();
    let args = Cli::parse();
    let cfg = args.config();

    let report = match cfg
        .parameters()
        .and_then(|params| cfg.build_simulation().execute(&params))
    {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    print!(
        "{}",
        Summary {
            config: &cfg,
            report: &report,
        }
    );
    if !args.no_histogram {
        if let Some(bins) = report.results.width_histogram(args.bins) {
            println!();
            print!(
                "{}",
                WidthHistogram {
                    bins: &bins,
                    width: BAR_WIDTH,
                }
            );
        }
    }
    ExitCode::SUCCESS
}

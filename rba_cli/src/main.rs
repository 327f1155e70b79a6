//! Resource Balance Analysis from the command line
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use rba_core::io::json::read_model_dir;
use rba_core::io::tsv::{format_boundary_fluxes, write_results};
use rba_core::{Solver, CONFIGURATION};

#[derive(Parser)]
#[command(name = "solve_rba")]
#[command(version = "0.1.0")]
#[command(about = "Find the optimal growth rate of a resource balance model", long_about = None)]
struct Cli {
    /// Directory holding model.json and an optional media/ directory
    #[arg(value_name = "MODEL_DIR")]
    model_dir: PathBuf,

    /// Medium to grow in
    #[arg(value_name = "MEDIUM", default_value = "default")]
    medium: String,

    /// Directory for the result tables (defaults to MODEL_DIR)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// LP backend (clarabel, highs or minilp)
    #[arg(short, long)]
    solver: Option<Solver>,

    /// Absolute tolerance on the growth rate
    #[arg(long, default_value = "1e-6")]
    tolerance: f64,

    /// Time limit in seconds for a single LP solve
    #[arg(long)]
    time_limit: Option<f64>,

    /// Number of growth rates below the optimum checked for feasibility
    #[arg(long, default_value = "0")]
    monotonicity_samples: usize,

    /// Number of boundary fluxes to print
    #[arg(long, default_value = "10")]
    top: usize,

    /// Log every growth rate tried
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) -> Result<()> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {l} {t} - {m}{n}")))
        .build();
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose).context("Unable to set up logging")?;

    {
        let mut configuration = CONFIGURATION
            .write()
            .map_err(|_| anyhow!("Configuration lock is poisoned"))?;
        if let Some(solver) = cli.solver {
            configuration.solver = solver;
        }
        configuration.time_limit = cli.time_limit;
        configuration.search.absolute_tolerance = cli.tolerance;
        configuration.search.monotonicity_samples = cli.monotonicity_samples;
    }

    let model = read_model_dir(&cli.model_dir)
        .with_context(|| format!("Unable to load model from {}", cli.model_dir.display()))?;
    let results = model
        .solve(&cli.medium)
        .with_context(|| format!("Unable to solve model in medium {}", cli.medium))?;

    let output = cli.output.unwrap_or_else(|| cli.model_dir.clone());
    write_results(&output, &results)
        .with_context(|| format!("Unable to write results to {}", output.display()))?;
    info!("Results written to {}", output.display());

    println!("Optimal growth rate: {}", results.growth_rate());
    println!("Top {} boundary fluxes:", cli.top);
    print!("{}", format_boundary_fluxes(&results, cli.top));
    Ok(())
}

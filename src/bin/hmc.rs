//! Command-line front end: samples one of the reference targets and writes
//! the chain to a dataset directory. Ctrl-C stops the run after the current
//! proposal and still leaves a complete, readable dataset behind.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use hmc_tomography::config::HmcConfig;
use hmc_tomography::distributions::{Distribution, Himmelblau, Laplace, Normal, Uniform};
use hmc_tomography::hmc::Hmc;
use hmc_tomography::interrupt::Interrupt;
use hmc_tomography::io::csv::save_csv;
use hmc_tomography::io::file::FileStore;
use hmc_tomography::io::Dataset;
use hmc_tomography::mass_matrix::{Diagonal, MassMatrix, Unit};
use hmc_tomography::stats::{IndicatifProgress, Progress};
use ndarray::Array1;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    /// Standard normal in every dimension
    Normal,
    /// Unit Laplace in every dimension
    Laplace,
    /// Himmelblau's function (two dimensions only)
    Himmelblau,
}

#[derive(Parser)]
#[command(name = "hmc")]
#[command(about = "Hamiltonian Monte Carlo sampling of reference misfit functions")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Dataset directory to write
    #[arg(short, long)]
    output: PathBuf,

    /// Replace an existing dataset at the output path
    #[arg(long)]
    overwrite: bool,

    /// Also export the samples as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "normal")]
    target: Target,

    /// Number of model parameters
    #[arg(short, long, default_value = "2")]
    dimensions: usize,

    /// Annealing temperature of the Himmelblau target
    #[arg(long, default_value = "20.0")]
    annealing: f64,

    /// Lower bounds of a uniform prior, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    lower: Option<Vec<f64>>,

    /// Upper bounds of a uniform prior, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    upper: Option<Vec<f64>>,

    /// Diagonal of the mass matrix, comma separated (identity if absent)
    #[arg(long, value_delimiter = ',')]
    masses: Option<Vec<f64>>,

    /// Starting point, comma separated (ones if absent)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    initial: Option<Vec<f64>>,

    #[arg(short, long, default_value = "100")]
    proposals: usize,

    /// Keep every n-th state of the chain
    #[arg(long, default_value = "1")]
    online_thinning: usize,

    /// Samples held in RAM between writes
    #[arg(long, default_value = "1000")]
    ram_buffer_size: usize,

    #[arg(long, default_value = "0.1")]
    step_size: f64,

    #[arg(long, default_value = "10")]
    steps: usize,

    /// Use the nominal step size for every proposal
    #[arg(long)]
    fixed_step_size: bool,

    /// Use the nominal number of steps for every proposal
    #[arg(long)]
    fixed_steps: bool,

    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many seconds
    #[arg(long)]
    max_time: Option<f64>,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

fn build_target(cli: &Cli) -> Result<Box<dyn Distribution>> {
    let d = cli.dimensions;
    Ok(match cli.target {
        Target::Normal => Box::new(Normal::new(Array1::zeros(d), Array1::ones(d))?),
        Target::Laplace => Box::new(Laplace::new(Array1::zeros(d), Array1::ones(d))?),
        Target::Himmelblau => {
            if d != 2 {
                bail!("the Himmelblau target is two-dimensional, got --dimensions {d}");
            }
            Box::new(Himmelblau {
                annealing: cli.annealing,
            })
        }
    })
}

fn build_prior(cli: &Cli) -> Result<Uniform> {
    let d = cli.dimensions;
    if cli.lower.is_none() && cli.upper.is_none() {
        return Ok(Uniform::unbounded(d));
    }
    let lower = cli
        .lower
        .clone()
        .map(Array1::from_vec)
        .unwrap_or_else(|| Array1::from_elem(d, f64::NEG_INFINITY));
    let upper = cli
        .upper
        .clone()
        .map(Array1::from_vec)
        .unwrap_or_else(|| Array1::from_elem(d, f64::INFINITY));
    Uniform::new(lower, upper).context("invalid prior bounds")
}

fn build_mass_matrix(cli: &Cli) -> Result<Box<dyn MassMatrix>> {
    Ok(match &cli.masses {
        Some(masses) => Box::new(Diagonal::new(Array1::from_vec(masses.clone()))?),
        None => Box::new(Unit::new(cli.dimensions)),
    })
}

fn build_config(cli: &Cli) -> Result<HmcConfig> {
    let mut config = HmcConfig::default()
        .set_proposals(cli.proposals)
        .set_online_thinning(cli.online_thinning)
        .set_ram_buffer_size(cli.ram_buffer_size)
        .set_step_size(cli.step_size)
        .set_steps(cli.steps)
        .set_randomize_step_size(!cli.fixed_step_size)
        .set_randomize_steps(!cli.fixed_steps);
    if let Some(initial) = &cli.initial {
        config = config.set_initial_coordinates(Array1::from_vec(initial.clone()));
    }
    if let Some(seed) = cli.seed {
        config = config.set_seed(seed);
    }
    if let Some(seconds) = cli.max_time {
        let limit = Duration::try_from_secs_f64(seconds)
            .with_context(|| format!("invalid --max-time {seconds}"))?;
        config = config.set_max_time(limit);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .init();

    let sampler = Hmc::new(build_target(&cli)?, build_prior(&cli)?, build_mass_matrix(&cli)?)?;
    let config = build_config(&cli)?;

    let interrupt = Interrupt::new();
    let handle = interrupt.clone();
    ctrlc::set_handler(move || handle.trigger()).context("installing the Ctrl-C handler")?;

    let store = FileStore::new(&cli.output).set_overwrite(cli.overwrite);
    let mut progress: Box<dyn Progress> = if cli.quiet {
        Box::new(())
    } else {
        Box::new(IndicatifProgress::new())
    };
    let outcome = sampler.sample(store, &config, &interrupt, progress.as_mut())?;

    println!(
        "{} proposals, acceptance rate {:.3}, {} samples written to {}{}",
        outcome.proposals,
        outcome.acceptance_rate(),
        outcome.columns_written,
        outcome.finalized.display(),
        if outcome.interrupted() {
            " (stopped early)"
        } else {
            ""
        }
    );

    if let Some(csv_path) = &cli.csv {
        let dataset = Dataset::read(&outcome.finalized)?;
        save_csv(&dataset, csv_path)?;
    }
    Ok(())
}

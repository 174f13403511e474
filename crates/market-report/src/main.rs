//! Markov market simulation runner.
//!
//! Loads a configuration, runs the simulation, prints interval updates and
//! the final participant report, and optionally writes JSON output.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use market_core::{default_config_toml, run_simulation, SimulationConfig, DEFAULT_CONFIG_PATH};
use market_report::{write_all, MarketReport, DEFAULT_INITIAL_VALUE};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "market_sim")]
#[command(about = "A Markov-chain market driven by investor participation")]
struct Args {
    /// Configuration file (defaults to market.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Number of investors
    #[arg(long)]
    investors: Option<usize>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// Feedback sensitivity to participation change
    #[arg(long)]
    sensitivity: Option<f64>,

    /// Ticks between interval reports
    #[arg(long, default_value_t = 5)]
    interval: usize,

    /// Starting portfolio value per investor
    #[arg(long, default_value_t = DEFAULT_INITIAL_VALUE)]
    initial_value: f64,

    /// Directory for history.json, ticks.jsonl, market_value.json and report.json
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn load_config(args: &Args) -> Result<SimulationConfig, market_core::ConfigError> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            SimulationConfig::from_file(DEFAULT_CONFIG_PATH)?
        }
        None => SimulationConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }
    if let Some(investors) = args.investors {
        config.num_investors = investors;
    }
    if let Some(ticks) = args.ticks {
        config.num_ticks = ticks;
    }
    if let Some(sensitivity) = args.sensitivity {
        config.feedback.sensitivity = sensitivity;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_toml()?);
        return Ok(());
    }

    let config = load_config(&args)?;

    println!("Markov Market Simulation");
    println!("========================");
    println!("Seed: {}", config.random_seed);
    println!("Investors: {}", config.num_investors);
    println!("Ticks: {}", config.num_ticks);
    println!("Feedback sensitivity: {}", config.feedback.sensitivity);
    println!();

    let history = run_simulation(&config)?;
    let report = MarketReport::build(&history, args.interval, args.initial_value)?;

    print!("{}", report.render());

    if let Some(dir) = &args.output {
        write_all(&history, &report, dir)?;
        println!();
        println!("Output written to {}", dir.display());
    }

    Ok(())
}

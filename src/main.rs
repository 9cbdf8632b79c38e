use anyhow::Result;
use clap::{Parser, Subcommand};
use cpnflow::commands;
use cpnflow::config::ScenarioConfig;
use cpnflow_core::amc::{ABSORBING_STATES, PRODUCTION, TRANSIENT_STATES};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "cpnflow",
    version,
    about = "Compare counting-based and material-flow estimates of recycled flows"
)]
struct Cli {
    /// Scenario file (TOML). Defaults to the plastic recycling case study
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the output directory of the scenario
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve the material-flow model
    Mfa,
    /// Plot reentries and occupancy from simulation logs
    Cfa,
    /// Compare simulation logs against the material-flow model
    Compare,
    /// Dynamic LCA: radiative forcing of the recycling inflow
    Lca,
    /// Closed-form absorbing Markov chain summary
    Amc,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    let written = match cli.command {
        Command::Mfa => commands::run_mfa(&config)?,
        Command::Cfa => commands::run_cfa(&config)?,
        Command::Compare => commands::run_compare(&config)?,
        Command::Lca => commands::run_lca(&config)?,
        Command::Amc => {
            let (summary, path) = commands::run_amc(&config)?;
            println!("States: {TRANSIENT_STATES:?} -> {ABSORBING_STATES:?}");
            println!("Expected visits (quantity * N):{}", summary.expected_visits);
            println!("Absorbed (quantity * N R):{}", summary.absorbed);
            println!(
                "Absorbed from {}: {:?}",
                TRANSIENT_STATES[PRODUCTION],
                summary.absorbed.row(PRODUCTION).iter().collect::<Vec<_>>()
            );
            println!("Expected time in use: {:.3}", summary.expected_time_in_use);
            vec![path]
        }
    };

    for path in written {
        info!(path = %path.display(), "Wrote output");
    }
    Ok(())
}

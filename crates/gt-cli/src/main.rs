//! # gtix Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

use gt_cli::keygen::{run_keygen, KeygenArgs};
use gt_cli::simulate::{run_simulate, SimulateArgs};

/// Golden Ticket toolchain.
///
/// Generates oracle keys and simulates encrypted-threshold verification
/// end to end against the mock confidential-compute network.
#[derive(Parser, Debug)]
#[command(name = "gtix", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Generate Ed25519 oracle node keys.
    Keygen(KeygenArgs),
    /// Run a YAML scenario and print the report.
    Simulate(SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Keygen(args) => {
            let keys = run_keygen(&args)?;
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
        Commands::Simulate(args) => {
            print!("{}", run_simulate(&args)?);
        }
    }

    Ok(())
}

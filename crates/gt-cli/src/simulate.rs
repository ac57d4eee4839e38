//! # Simulate Subcommand
//!
//! Loads a scenario file, runs it, and renders the report.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::scenario::{load_scenario, run_scenario, Report};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the YAML scenario.
    #[arg(long)]
    pub scenario: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn run_simulate(args: &SimulateArgs) -> anyhow::Result<String> {
    let scenario = load_scenario(&args.scenario)?;
    let report = run_scenario(&scenario)?;
    tracing::info!(
        steps = report.steps.len(),
        rejected = report.rejected().count(),
        total_supply = report.total_supply,
        "scenario complete"
    );
    match args.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => Ok(render_text(&report)),
    }
}

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "catalog   {}", report.catalog);
    let _ = writeln!(out, "registry  {}", report.registry);
    let _ = writeln!(out, "verifier  {}", report.verifier);
    out.push('\n');
    for step in &report.steps {
        let status = step.error_class.as_deref().unwrap_or("ok");
        let _ = writeln!(
            out,
            "[{:>3}] {:<13} {} -> {}",
            step.index, status, step.description, step.outcome
        );
    }
    out.push('\n');
    for (participant, balance) in &report.balances {
        let _ = writeln!(out, "{participant}: {balance}");
    }
    let _ = writeln!(
        out,
        "total supply {}, pending {}, ledger events {}",
        report.total_supply, report.pending, report.ledger_events
    );
    out
}

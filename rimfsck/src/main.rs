// rimfsck/src/main.rs

mod console;
mod run;
mod scenario;
mod table;
mod utils;

use clap::{Parser, Subcommand};
use rimfault::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

use crate::console::ConsoleSink;
use crate::run::{RunSettings, run_scenario};
use crate::scenario::{Scenario, ScenarioError};
use crate::utils::{LogLevel, set_log_level};

#[derive(Parser)]
#[command(name = "rimfsck", version, about = "Fault escalation and fsck negotiation driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a fault scenario and run its check pass
    Run {
        /// Scenario path
        #[arg(short, long, default_value = "scenario.toml")]
        scenario: PathBuf,

        /// Repair policy: yes, no or ask (overrides the scenario)
        #[arg(short, long)]
        policy: Option<RepairPolicy>,

        /// Only run checks of these phases (alloc, inodes, dirents, ...)
        #[arg(long = "phase")]
        phases: Vec<String>,

        /// Only print errors
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,

        /// Print every fault record and replay step
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print the fault classes and the fsck decision table
    Table {
        /// Restrict the table to one repair policy
        #[arg(short, long)]
        policy: Option<RepairPolicy>,
    },
}

fn parse_phases(names: &[String]) -> anyhow::Result<FsckPhases> {
    if names.is_empty() {
        return Ok(FsckPhases::ALL);
    }
    names.iter().try_fold(FsckPhases::empty(), |acc, name| {
        FsckPhases::by_name(name)
            .map(|p| acc | p)
            .ok_or_else(|| anyhow::Error::from(ScenarioError::UnknownPhase(name.clone())))
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            policy,
            phases,
            quiet,
            verbose,
        } => {
            set_log_level(match (quiet, verbose) {
                (true, _) => LogLevel::Quiet,
                (_, true) => LogLevel::Verbose,
                _ => LogLevel::Normal,
            });

            let path = scenario;
            let scenario = Scenario::from_file(&path)?;
            scenario.print_summary();

            let console = Arc::new(ConsoleSink::new());
            let summary = run_scenario(
                &scenario,
                RunSettings {
                    policy,
                    phases: parse_phases(&phases)?,
                    sink: console.clone(),
                    prompt: None,
                },
            )?;
            summary.print();
            log_verbose!("{} fault records emitted", console.emitted());

            if !summary.report.ok() {
                log_normal!("Check pass failed: {}", summary.report.code);
                std::process::exit(summary.exit_code());
            }
        }
        Commands::Table { policy } => table::print_table(policy),
    }

    Ok(())
}

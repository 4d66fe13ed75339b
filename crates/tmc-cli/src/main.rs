use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tmc_core::Step;

#[derive(Parser)]
#[command(name = "tmc", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a builder file and print the resulting plan
    Plan {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Validate and compile a builder file, printing step counts
    Check {
        #[arg(long)]
        file: PathBuf,
    },

    /// Print one step's command and environment
    Show {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        step: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan { file, format } => {
            let plan = tmc_builder::compile(&file)?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                Format::Text => {
                    for step in &plan.steps {
                        match step {
                            Step::Upload(u) => println!("upload {} -> {}", u.local_path, u.remote_pattern),
                            other => println!("{}", other.description().unwrap_or("")),
                        }
                    }
                }
            }
            eprintln!("fingerprint: {}", plan.fingerprint());
        }
        Command::Check { file } => {
            let plan = tmc_builder::compile(&file)?;
            println!(
                "{}: {} steps ({} builds, {} tests)",
                plan.worker.name,
                plan.steps.len(),
                plan.build_steps().count(),
                plan.test_steps().count()
            );
        }
        Command::Show { file, step } => {
            let plan = tmc_builder::compile(&file)?;
            let step = plan
                .steps
                .get(step)
                .ok_or_else(|| anyhow!("step {} out of range (plan has {})", step, plan.steps.len()))?;
            println!("{}", serde_json::to_string_pretty(step)?);
        }
    }
    Ok(())
}

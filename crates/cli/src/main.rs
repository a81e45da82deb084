//! Water potability CLI
//!
//! A command-line tool for scoring water samples, training artifact
//! bundles and inspecting what the server would load.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{inspect, predict, train};
use potability_lib::training::TrainingVariant;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Water potability CLI
#[derive(Parser)]
#[command(name = "potability")]
#[command(author, version, about = "CLI for the water potability classifier", long_about = None)]
pub struct Cli {
    /// Directory holding the artifact bundles
    #[arg(long, env = "POTABILITY_MODELS_DIR", default_value = "models", global = true)]
    pub models_dir: PathBuf,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict potability for one sample or a CSV batch
    Predict {
        /// CSV file with the nine feature columns, in any order
        #[arg(long, conflicts_with = "features")]
        input_csv: Option<PathBuf>,

        /// Nine feature values in schema order (NaN marks a missing value)
        #[arg(long, num_args = 1.., allow_negative_numbers = true)]
        features: Option<Vec<f64>>,
    },

    /// Train a bundle and write it to the models directory
    Train {
        /// Training variant (demo, advanced, deep)
        #[arg(long, default_value = "advanced")]
        variant: TrainingVariant,

        /// Labelled dataset CSV (defaults to the cleaned dataset, then the raw one)
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Show the bundle the resolver selects
    Inspect,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Predict {
            input_csv,
            features,
        } => {
            predict::run(
                &cli.models_dir,
                input_csv.as_deref(),
                features.as_deref(),
                cli.format,
            )?;
        }
        Commands::Train { variant, data } => {
            train::run(&cli.models_dir, variant, data, cli.format)?;
        }
        Commands::Inspect => {
            inspect::run(&cli.models_dir, cli.format)?;
        }
    }

    Ok(())
}

//! stride: developer CLI for a Stride data directory.
//!
//! Reads and edits the same files the mobile engine uses, without any native
//! collaborators. Useful for seeding plans on an emulator image or checking
//! what the daily log recorded.
//!
//! ## Subcommands
//!
//! - `plans`: list, add, duplicate, pause/resume, delete, import/export
//! - `goals`: today's aggregated (or still unmet) goals
//! - `history`: recent daily activity
//! - `config`: show or change `config.json`

mod logging;
mod plans;
mod report;
mod settings;

use std::io::Write;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use stride_core::{StorageConfig, StrideError};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "Inspect and edit a Stride data directory")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage blocking plans
    Plans {
        #[command(subcommand)]
        action: plans::PlanCommand,
    },

    /// Show today's goals across active plans
    Goals {
        /// Subtract what the daily log already recorded today
        #[arg(long)]
        unmet: bool,
    },

    /// Show recent daily activity, newest first
    History {
        /// Number of days with activity to show
        #[arg(long, default_value_t = 7)]
        days: usize,

        /// Print raw JSON records
        #[arg(long)]
        json: bool,
    },

    /// Show or change app configuration
    Config {
        #[command(subcommand)]
        action: settings::ConfigCommand,
    },
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] StrideError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidArgument(String),
}

fn main() {
    let cli = Cli::parse();
    let storage = cli
        .root
        .map(StorageConfig::with_root)
        .unwrap_or_default();
    let _logging_guard = logging::init(&storage);

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = run(cli.command, &storage, Local::now().naive_local(), &mut stdout) {
        tracing::error!(error = %e, "stride command failed");
        eprintln!("stride: {e}");
        std::process::exit(1);
    }
}

fn run(
    command: Commands,
    storage: &StorageConfig,
    now: NaiveDateTime,
    out: &mut impl Write,
) -> Result<(), CliError> {
    storage.ensure_dirs()?;
    match command {
        Commands::Plans { action } => plans::run(storage, action, now, out),
        Commands::Goals { unmet } => report::goals(storage, unmet, now, out),
        Commands::History { days, json } => report::history(storage, days, json, out),
        Commands::Config { action } => settings::run(storage, action, out),
    }
}

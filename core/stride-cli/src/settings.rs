//! `stride config ...`

use std::io::Write;

use clap::{Subcommand, ValueEnum};
use stride_core::{load_app_config, save_app_config, StorageConfig};

use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print config.json with defaults filled in
    Show,

    /// Turn background (motion-triggered) tracking on or off
    SetBackground {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Ignore activity transitions below this confidence (0-100)
    SetMinConfidence {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        value: u8,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

pub fn run(
    storage: &StorageConfig,
    command: ConfigCommand,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut config = load_app_config(storage);
    match command {
        ConfigCommand::Show => {
            serde_json::to_writer_pretty(&mut *out, &config)?;
            writeln!(out)?;
        }
        ConfigCommand::SetBackground { state } => {
            config.background_tracking_enabled = state == Toggle::On;
            save_app_config(storage, &config)?;
            tracing::info!(
                enabled = config.background_tracking_enabled,
                "Background tracking changed from CLI"
            );
            writeln!(
                out,
                "Background tracking {}",
                if config.background_tracking_enabled { "enabled" } else { "disabled" }
            )?;
        }
        ConfigCommand::SetMinConfidence { value } => {
            config.min_motion_confidence = value;
            save_app_config(storage, &config)?;
            writeln!(out, "Minimum motion confidence set to {value}")?;
        }
    }
    Ok(())
}

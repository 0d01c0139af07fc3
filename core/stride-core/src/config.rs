//! App configuration loading and saving.
//!
//! `config.json` holds the background-tracking preference (read by both the
//! foreground engine and the headless task) and cadence tuning. Missing or
//! corrupt files yield defaults.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{read_json, write_json_atomic, StorageConfig};

/// Distance goal handed to the native service for manual sessions. The core
/// decides when the aggregated goal is met, so this only has to be out of reach.
pub const DEFAULT_MANUAL_GOAL_PLACEHOLDER_METERS: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct AppConfig {
    pub background_tracking_enabled: bool,
    pub interpolation_interval_secs: u64,
    pub blocker_sync_interval_secs: u64,
    pub plan_reload_interval_secs: u64,
    pub manual_goal_placeholder_meters: f64,
    /// Activity-transition events below this confidence (0-100) are ignored.
    pub min_motion_confidence: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            background_tracking_enabled: false,
            interpolation_interval_secs: 1,
            blocker_sync_interval_secs: 15,
            plan_reload_interval_secs: 300,
            manual_goal_placeholder_meters: DEFAULT_MANUAL_GOAL_PLACEHOLDER_METERS,
            min_motion_confidence: 0,
        }
    }
}

/// Loads the app configuration, returning defaults if the file doesn't exist.
pub fn load_app_config(storage: &StorageConfig) -> AppConfig {
    read_json(&storage.config_file()).unwrap_or_default()
}

/// Saves the app configuration to disk.
pub fn save_app_config(storage: &StorageConfig, config: &AppConfig) -> Result<()> {
    write_json_atomic(&storage.config_file(), config)
}

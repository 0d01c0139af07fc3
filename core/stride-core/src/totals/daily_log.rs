//! Per-date activity log (`daily-activity.json`).
//!
//! Records are upserted by increment: closing a session adds its distance and
//! time to whatever the date already holds. Dates with no activity have no
//! record. Every call re-reads the file so a write from another process (the
//! headless task, the CLI) is never lost.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{read_json, write_json_atomic};
use crate::types::{DailyActivity, TrackingProgress};

pub const DAILY_LOG_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct DailyLogFile {
    version: u32,
    /// Date (`YYYY-MM-DD`) → record. BTreeMap keeps the file sorted by date.
    #[serde(default)]
    days: BTreeMap<String, DailyActivity>,
}

impl Default for DailyLogFile {
    fn default() -> Self {
        Self {
            version: DAILY_LOG_VERSION,
            days: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DailyLog {
    file_path: PathBuf,
}

impl DailyLog {
    pub fn new(file_path: &Path) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
        }
    }

    fn load(&self) -> DailyLogFile {
        match read_json::<DailyLogFile>(&self.file_path) {
            Some(file) if file.version == DAILY_LOG_VERSION => file,
            Some(file) => {
                tracing::warn!(
                    version = file.version,
                    expected = DAILY_LOG_VERSION,
                    "Unsupported daily log version, treating as empty"
                );
                DailyLogFile::default()
            }
            None => DailyLogFile::default(),
        }
    }

    pub fn get(&self, date: &str) -> Option<DailyActivity> {
        self.load().days.get(date).cloned()
    }

    /// Adds `delta` to the record for `date`, creating it if needed.
    pub fn upsert(&self, date: &str, delta: &TrackingProgress) -> Result<DailyActivity> {
        let mut file = self.load();
        let record = file
            .days
            .entry(date.to_string())
            .or_insert_with(|| DailyActivity {
                date: date.to_string(),
                ..DailyActivity::default()
            });
        record.distance_meters += delta.distance_meters;
        record.elapsed_seconds += delta.elapsed_seconds;
        record.goals_reached = record.goals_reached || delta.goal_reached;
        let updated = record.clone();

        write_json_atomic(&self.file_path, &file)?;
        tracing::debug!(
            date = %date,
            distance_meters = updated.distance_meters,
            elapsed_seconds = updated.elapsed_seconds,
            "Daily log upserted"
        );
        Ok(updated)
    }

    /// Most recent `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<DailyActivity> {
        self.load().days.into_values().rev().take(limit).collect()
    }
}

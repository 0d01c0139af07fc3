//! Storage configuration and path management for Stride.
//!
//! This module provides a centralized `StorageConfig` struct that manages all
//! file paths for Stride data, plus the atomic JSON helpers every file-backed
//! store goes through.
//!
//! ## Design Principles
//!
//! - **Single source of truth**: All path decisions centralized here
//! - **Testable**: `StorageConfig::with_root()` enables test injection
//! - **Atomic writes**: temp file + rename so a killed process never leaves a
//!   half-written file behind

use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Result, StrideError};

/// Central configuration for all Stride storage paths.
///
/// Production code uses `StorageConfig::default()` which points to the
/// platform data directory. Mobile hosts pass their app-private files dir
/// through `with_root`, tests pass a temp dir.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            root: base.join("stride"),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory for Stride data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to plans.json (blocking plans).
    pub fn plans_file(&self) -> PathBuf {
        self.root.join("plans.json")
    }

    /// Path to daily-activity.json (per-date activity totals).
    pub fn daily_log_file(&self) -> PathBuf {
        self.root.join("daily-activity.json")
    }

    /// Path to config.json (preferences and cadence tuning).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Path to logs/ directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Ensures the root directory and standard subdirectories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

/// Reads a JSON file, returning `None` when it is missing, empty or corrupt.
///
/// Corrupt content is logged and treated as absent so a bad write from an
/// older build can never wedge the controller.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Failed to read store file");
            return None;
        }
    };

    if content.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "Failed to parse store file, treating as empty"
            );
            None
        }
    }
}

/// Serializes `value` to `path` through a temp file in the same directory.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StrideError::InvalidStoragePath(path.to_path_buf()))?;
    fs::create_dir_all(parent).map_err(|source| StrideError::Io {
        context: format!("creating {}", parent.display()),
        source,
    })?;

    let content = serde_json::to_string_pretty(value).map_err(|source| StrideError::Json {
        context: format!("serializing {}", path.display()),
        source,
    })?;

    let io_err = |context: &str| {
        let context = format!("{} {}", context, path.display());
        move |source| StrideError::Io { context, source }
    };

    let mut temp_file = NamedTempFile::new_in(parent).map_err(io_err("creating temp file for"))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(io_err("writing temp file for"))?;
    temp_file.flush().map_err(io_err("flushing temp file for"))?;
    temp_file
        .persist(path)
        .map_err(|e| e.error)
        .map_err(io_err("persisting"))?;

    Ok(())
}

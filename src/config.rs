//! Configuration for the reelkv store.
//!
//! Settings are resolved in three layers, later layers winning:
//!
//! 1. Built-in defaults (persist to `~/.reelkv/db.json`, save every 30s)
//! 2. A TOML file (`--config` path, or `~/.reelkv/reelkv.toml` if present)
//! 3. Environment variables (`REELKV_PERSIST`, `REELKV_SNAPSHOT_PATH`,
//!    `REELKV_SAVE_INTERVAL`)
//!
//! ```toml
//! persist = true
//! snapshot_path = "/var/lib/reel/db.json"
//! save_interval_secs = 30
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

/// Default interval between background snapshot saves.
pub const DEFAULT_SAVE_INTERVAL_SECS: u64 = 30;

/// Switches between file persistence and in-memory only mode.
pub const PERSIST_ENV: &str = "REELKV_PERSIST";

/// Overrides the snapshot file path.
pub const SNAPSHOT_PATH_ENV: &str = "REELKV_SNAPSHOT_PATH";

/// Overrides the autosave interval, in seconds.
pub const SAVE_INTERVAL_ENV: &str = "REELKV_SAVE_INTERVAL";

/// Intervals above this trigger a validation warning.
const LONG_INTERVAL_SECS: u64 = 3600;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Write snapshots to `snapshot_path`. When false the store is
    /// in-memory only and every restart starts empty.
    pub persist: bool,

    /// Snapshot file location.
    pub snapshot_path: PathBuf,

    /// Seconds between background saves.
    pub save_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist: true,
            snapshot_path: default_snapshot_path(),
            save_interval_secs: DEFAULT_SAVE_INTERVAL_SECS,
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    paths::get_snapshot_path().unwrap_or_else(|_| PathBuf::from("reelkv-db.json"))
}

impl StoreConfig {
    /// Resolve configuration from defaults, a TOML file, and the environment.
    ///
    /// An explicit `path` must exist. Without one, `~/.reelkv/reelkv.toml` is
    /// read when present and silently skipped otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an
    /// environment override holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => match paths::get_config_path() {
                Ok(default_path) if default_path.exists() => Self::load_from(&default_path)?,
                _ => Self::default(),
            },
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from the specified TOML file.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax or unknown fields
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an override holds an invalid value.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if `REELKV_PERSIST` is not a recognized flag or
    /// `REELKV_SAVE_INTERVAL` is not a number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(raw) = var(PERSIST_ENV) {
            self.persist = parse_persist_flag(&raw)
                .with_context(|| format!("Invalid {PERSIST_ENV} value"))?;
        }

        if let Some(raw) = var(SNAPSHOT_PATH_ENV) {
            self.snapshot_path = PathBuf::from(raw);
        }

        if let Some(raw) = var(SAVE_INTERVAL_ENV) {
            self.save_interval_secs = raw.trim().parse().with_context(|| {
                format!("Invalid {SAVE_INTERVAL_ENV} value '{raw}': expected seconds")
            })?;
        }

        Ok(())
    }

    /// Interval between background saves.
    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs)
    }

    /// Validate configuration.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `save_interval_secs` is 0
    /// - persistence is enabled with an empty snapshot path
    /// - the snapshot path points at an existing directory
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.save_interval_secs == 0 {
            errors.push(format!(
                "save_interval_secs cannot be 0 (default: {DEFAULT_SAVE_INTERVAL_SECS})"
            ));
        } else if self.save_interval_secs > LONG_INTERVAL_SECS {
            warnings.push(format!(
                "save_interval_secs {} is over an hour\n  \
                 Mutations are still saved immediately, but a failed save may go \
                 unretried for that long",
                self.save_interval_secs
            ));
        }

        if self.persist {
            if self.snapshot_path.as_os_str().is_empty() {
                errors.push("snapshot_path cannot be empty when persist is enabled".to_string());
            } else if self.snapshot_path.is_dir() {
                errors.push(format!(
                    "snapshot_path is a directory: {}\n  \
                     Point it at a file, e.g. {}",
                    self.snapshot_path.display(),
                    self.snapshot_path.join("db.json").display()
                ));
            }
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}

/// Parse the persistence switch.
///
/// Accepts `1/true/yes/on/file` for file persistence and
/// `0/false/no/off/memory` for in-memory only (case-insensitive).
///
/// # Errors
///
/// Returns an error for any other value.
pub fn parse_persist_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "file" => Ok(true),
        "0" | "false" | "no" | "off" | "memory" => Ok(false),
        other => anyhow::bail!(
            "unrecognized persistence flag '{other}'\n  \
             Use 'file' (or true/1) to persist, 'memory' (or false/0) to disable"
        ),
    }
}

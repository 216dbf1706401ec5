//! Path utilities for reelkv files.
//!
//! - [`get_reelkv_dir`] - `~/.reelkv/` (base directory)
//! - [`get_snapshot_path`] - `~/.reelkv/db.json` (default snapshot file)
//! - [`get_config_path`] - `~/.reelkv/reelkv.toml` (default config file)

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable overriding the base directory.
pub const HOME_ENV: &str = "REELKV_HOME";

/// Get the reelkv base directory.
///
/// Resolution order:
/// 1. `REELKV_HOME` environment variable (if set and non-empty)
/// 2. `~/.reelkv/` (default)
pub fn get_reelkv_dir() -> Result<PathBuf> {
    resolve_reelkv_dir(std::env::var(HOME_ENV).ok(), dirs::home_dir())
}

fn resolve_reelkv_dir(env_home: Option<String>, user_home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(home) = env_home
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }

    let home = user_home.context("Failed to get home directory")?;
    Ok(home.join(".reelkv"))
}

/// Get the default snapshot path: `~/.reelkv/db.json`
pub fn get_snapshot_path() -> Result<PathBuf> {
    Ok(get_reelkv_dir()?.join("db.json"))
}

/// Get the default config path: `~/.reelkv/reelkv.toml`
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_reelkv_dir()?.join("reelkv.toml"))
}

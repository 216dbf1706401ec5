//! reelkv - JSON snapshot key-value store for the reel video-sharing backend.
//!
//! Holds arbitrary JSON documents in memory and persists the whole mapping
//! to a single snapshot file after every mutation and on a timer. Prefix
//! scans over composed keys (`video:1`, `video:list:alice`) stand in for
//! secondary indexes.
//!
//! - [`services::kv`] - the store, its backends and key conventions
//! - [`config`] - TOML and environment configuration
//! - [`paths`] - default file locations
//! - [`commands`] - CLI and shell front ends

pub mod commands;
pub mod config;
pub mod paths;
pub mod services;

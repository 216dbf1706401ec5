//! One-shot store commands.
//!
//! Shared by the CLI subcommands (`reelkv get`, `reelkv set`, ...) and the
//! interactive shell. A mutation whose save failed is retried once with an
//! explicit flush so the failure reaches the user instead of only the log.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::{Map, Value};
use std::io::Write;

use crate::services::kv::KvStore;

/// Store operations available from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum KvCommand {
    /// Print the value of one or more keys (null when missing)
    Get {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Store a value; VALUE is parsed as JSON, falling back to a string
    Set { key: String, value: String },

    /// Delete one or more keys
    #[command(alias = "del")]
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Print every entry whose key starts with PREFIX as a JSON object
    Scan { prefix: String },

    /// List keys, optionally filtered by prefix
    Keys {
        #[arg(long, short)]
        prefix: Option<String>,
    },

    /// Show entry counts per entity
    Stats,
}

/// Parse a command-line value as JSON, or keep it as a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Run a command against the store, writing results to `out`.
///
/// # Errors
///
/// Returns an error if writing output fails, or if the snapshot cannot be
/// saved after a mutation.
pub async fn execute<W: Write + ?Sized>(store: &KvStore, command: KvCommand, out: &mut W) -> Result<()> {
    match command {
        KvCommand::Get { keys } => {
            for value in store.get_many(&keys) {
                let value = value.unwrap_or(Value::Null);
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            }
        },
        KvCommand::Set { key, value } => {
            store.set(key, parse_value(&value)).await;
            ensure_saved(store).await?;
            writeln!(out, "OK")?;
        },
        KvCommand::Delete { keys } => {
            let removed = store.delete_many(&keys).await;
            ensure_saved(store).await?;
            writeln!(out, "deleted {removed}")?;
        },
        KvCommand::Scan { prefix } => {
            let matches: Map<String, Value> = store.scan_prefix(&prefix).into_iter().collect();
            writeln!(
                out,
                "{}",
                serde_json::to_string_pretty(&Value::Object(matches))?
            )?;
        },
        KvCommand::Keys { prefix } => {
            for key in store.keys(prefix.as_deref()) {
                writeln!(out, "{key}")?;
            }
        },
        KvCommand::Stats => {
            writeln!(out, "backend: {}", store.backend_name())?;
            writeln!(out, "entries: {}", store.len())?;
            let counts = store.entity_counts();
            let width = counts.keys().map(String::len).max().unwrap_or(0);
            for (entity, count) in counts {
                writeln!(out, "  {entity:<width$}  {count}")?;
            }
        },
    }

    Ok(())
}

/// Mutations already save; only a failed save is retried and reported.
async fn ensure_saved(store: &KvStore) -> Result<()> {
    if !store.has_unsaved_changes() {
        return Ok(());
    }
    store
        .flush()
        .await
        .with_context(|| format!("Failed to save snapshot ({})", store.backend_name()))
}

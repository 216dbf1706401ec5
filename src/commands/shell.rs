//! Interactive shell over a long-lived store.
//!
//! Reads one command per line from stdin while the autosave timer runs in
//! the background. Stops on EOF, `quit`/`exit`, or Ctrl+C, then performs a
//! final flush.
//!
//! ```text
//! > set video:1 {"title": "A", "views": 0}
//! OK
//! > scan video:
//! { "video:1": { "title": "A", "views": 0 } }
//! > quit
//! ```

use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tokio::sync::mpsc;

use super::kv::{KvCommand, execute};
use crate::services::kv::KvStore;

const HELP: &str = "\
commands:
  get <key>...            print values
  set <key> <json>        store a value
  delete <key>...         delete keys (alias: del)
  scan <prefix>           print matching entries
  keys [prefix]           list keys
  stats                   entry counts per entity
  save                    flush the snapshot now
  help                    show this message
  quit                    save and exit (alias: exit)";

/// A parsed shell line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Line {
    Command(KvCommand),
    Save,
    Help,
    Quit,
}

/// Parse one shell line. Blank lines and `#` comments yield `None`.
pub(crate) fn parse_line(line: &str) -> Result<Option<Line>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let words = || rest.split_whitespace().map(str::to_string).collect::<Vec<_>>();

    let parsed = match verb.to_ascii_lowercase().as_str() {
        "get" | "delete" | "del" if rest.is_empty() => bail!("{verb}: expected at least one key"),
        "get" => Line::Command(KvCommand::Get { keys: words() }),
        "delete" | "del" => Line::Command(KvCommand::Delete { keys: words() }),
        "set" => {
            let Some((key, value)) = rest.split_once(char::is_whitespace) else {
                bail!("set: expected <key> <json>");
            };
            Line::Command(KvCommand::Set {
                key: key.to_string(),
                value: value.trim().to_string(),
            })
        },
        "scan" => Line::Command(KvCommand::Scan {
            prefix: rest.to_string(),
        }),
        "keys" => Line::Command(KvCommand::Keys {
            prefix: (!rest.is_empty()).then(|| rest.to_string()),
        }),
        "stats" => Line::Command(KvCommand::Stats),
        "save" | "flush" => Line::Save,
        "help" | "?" => Line::Help,
        "quit" | "exit" => Line::Quit,
        other => bail!("unknown command '{other}' (try 'help')"),
    };

    Ok(Some(parsed))
}

/// Process shell lines from `input` until EOF, `quit`, or `shutdown`
/// resolves.
///
/// Errors from individual commands are printed and do not stop the loop.
///
/// # Errors
///
/// Returns an error only if reading input or writing output fails.
pub(crate) async fn process<W, S>(
    store: &KvStore,
    mut input: mpsc::Receiver<io::Result<String>>,
    out: &mut W,
    shutdown: S,
) -> Result<()>
where
    W: Write + ?Sized,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            () = &mut shutdown => break,
            line = input.recv() => match line {
                Some(line) => line.context("Failed to read input")?,
                None => break,
            },
        };

        match parse_line(&line) {
            Ok(None) => {},
            Ok(Some(Line::Quit)) => break,
            Ok(Some(Line::Help)) => writeln!(out, "{HELP}")?,
            Ok(Some(Line::Save)) => match store.flush().await {
                Ok(()) => writeln!(out, "saved")?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Ok(Some(Line::Command(command))) => {
                if let Err(e) = execute(store, command, out).await {
                    writeln!(out, "error: {e:#}")?;
                }
            },
            Err(e) => writeln!(out, "error: {e}")?,
        }
        out.flush()?;
    }

    Ok(())
}

/// Read stdin lines on a dedicated thread.
///
/// A blocking stdin read cannot be cancelled, so it must not run on the
/// runtime's blocking pool or shutdown would wait for the next line.
fn spawn_stdin_reader() -> mpsc::Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Resolves on the first Ctrl+C.
async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::warn!("Ctrl+C received, saving snapshot"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        },
    }
}

/// Run the shell on stdin/stdout with autosave every `interval`.
///
/// # Errors
///
/// Returns an error if stdin or stdout fail.
pub async fn run(store: &KvStore, interval: Duration) -> Result<()> {
    let autosave = store.spawn_autosave(interval);
    let mut stdout = std::io::stdout();

    tracing::info!(
        backend = %store.backend_name(),
        entries = store.len(),
        "Store ready, type 'help' for commands"
    );

    let result = process(store, spawn_stdin_reader(), &mut stdout, ctrl_c()).await;

    autosave.stop();
    store.shutdown().await;
    result
}

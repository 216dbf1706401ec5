use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use reelkv::commands::{self, kv::KvCommand};
use reelkv::config::StoreConfig;
use reelkv::services::kv::KvStore;

#[derive(Parser)]
#[command(name = "reelkv")]
#[command(about = "Inspect and edit the reel JSON snapshot store", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.reelkv/reelkv.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Snapshot file to use, overriding config and environment
    #[arg(long, global = true, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Run without persistence (every start is empty)
    #[arg(long, global = true, conflicts_with = "snapshot")]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Kv(KvCommand),

    /// Interactive shell with periodic autosave
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Shell => "info",
        Commands::Kv(_) => "warn",
    };
    commands::init_logging(default_level);

    let mut config = StoreConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.snapshot {
        config.snapshot_path = path;
        config.persist = true;
    }
    if cli.memory {
        config.persist = false;
    }

    let validation = config.validate()?;
    for warning in &validation.warnings {
        tracing::warn!("{warning}");
    }
    tracing::debug!(?config, "Resolved configuration");

    let store = KvStore::open(&config).await;

    match cli.command {
        Commands::Kv(command) => {
            commands::kv::execute(&store, command, &mut std::io::stdout()).await
        },
        Commands::Shell => commands::shell::run(&store, config.save_interval()).await,
    }
}

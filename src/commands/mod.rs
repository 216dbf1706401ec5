//! CLI command implementations for reelkv.
//!
//! - [`kv`] - One-shot store operations (get/set/delete/scan/keys/stats)
//! - [`shell`] - Interactive shell over a long-lived store with autosave

pub mod kv;
pub mod shell;

/// Initialize stderr logging.
///
/// `RUST_LOG` wins over `default_directive` when set. Logs go to stderr so
/// command output on stdout stays machine-readable.
pub fn init_logging(default_directive: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

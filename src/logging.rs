//! Diagnostic logging.
//!
//! Backend failures are logged here with their full cause chain; users only ever see the
//! collapsed per-operation message held in the controller's slices.
//!
//! Priority: RUST_LOG env var > `--debug` > default "info".

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "info";

fn env_filter(debug: bool) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(DEFAULT_LOG_LEVEL)
    }
}

/// Log to stderr. Used by the non-interactive modes.
pub fn init_stderr(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Log to `path`, appending. The TUI owns the terminal, so it never logs to stderr.
pub fn init_file(debug: bool, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "logging initialised");
    Ok(())
}

/// Default TUI log location: `<data_local_dir>/log-intel/log-intel.log`.
pub fn default_log_file() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("log-intel").join("log-intel.log"))
}

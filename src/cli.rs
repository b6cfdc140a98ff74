use crate::backend::HttpBackend;
use crate::input::normalize_lines;
use crate::model::ClientConfig;
use crate::orchestrator::{IngestOutcome, WorkflowController};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub(crate) const DEFAULT_SERVICE_NAME: &str = "OrderService";

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "log-intel",
    version,
    about = "Ingest application logs and review clustered analysis from a log-intelligence backend"
)]
pub struct Cli {
    /// Base URL of the log-intelligence backend
    #[arg(long, global = true, default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Per-request timeout
    #[arg(long, global = true, default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Print JSON instead of text (non-interactive commands only)
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Write diagnostics to this file (TUI default: the user data directory)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Print every stored log entry
    List,
    /// Submit raw log text for storage, then print the refreshed log list
    Ingest {
        /// Service the lines belong to
        #[arg(long, default_value = DEFAULT_SERVICE_NAME)]
        service: String,
        /// File with raw log text; omit or pass `-` to read stdin
        file: Option<PathBuf>,
    },
    /// Print the backend's clustered analysis of all stored logs
    Analyze,
}

pub async fn run(args: Cli) -> Result<()> {
    match args.command.clone().unwrap_or(Command::Tui) {
        Command::Tui => run_tui(args).await,
        command => {
            crate::logging::init_stderr(args.debug);
            run_command(&args, command).await
        }
    }
}

#[cfg(feature = "tui")]
async fn run_tui(args: Cli) -> Result<()> {
    crate::tui::run(args).await
}

#[cfg(not(feature = "tui"))]
async fn run_tui(_args: Cli) -> Result<()> {
    anyhow::bail!("built without TUI support; use the list, ingest or analyze commands")
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        timeout: Duration::from(args.timeout),
        user_agent: format!("log-intel/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// Build a controller talking to the configured backend over HTTP.
pub(crate) fn build_controller(args: &Cli) -> Result<WorkflowController> {
    let cfg = build_config(args);
    let backend = HttpBackend::new(&cfg).context("configure backend client")?;
    tracing::debug!(base_url = %cfg.base_url, timeout = ?cfg.timeout, "backend configured");
    Ok(WorkflowController::new(Arc::new(backend)))
}

fn read_raw_text(file: Option<&Path>) -> Result<String> {
    match file {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("read log text from {}", p.display())),
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("read log text from stdin")?;
            Ok(raw)
        }
    }
}

/// Run one non-interactive command against the controller and print the resulting slice.
async fn run_command(args: &Cli, command: Command) -> Result<()> {
    let ctrl = build_controller(args)?;
    let (out_tx, out_handle) = spawn_output_writer();
    let res = execute(args, &ctrl, command, &out_tx).await;
    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn execute(
    args: &Cli,
    ctrl: &WorkflowController,
    command: Command,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    match command {
        Command::Tui => unreachable!("tui is dispatched before run_command"),
        Command::List => {
            ctrl.load_logs().await;
            let logs = ctrl.snapshot().logs;
            if let Some(err) = logs.error {
                anyhow::bail!(err);
            }
            print_logs(args, &logs.data, out_tx)?;
        }
        Command::Ingest { service, file } => {
            let raw = tokio::task::spawn_blocking(move || read_raw_text(file.as_deref()))
                .await
                .context("input reader task failed")??;
            let line_count = normalize_lines(&raw).len();
            match ctrl.ingest_logs(&service, &raw).await {
                IngestOutcome::Rejected(e) => anyhow::bail!(e),
                IngestOutcome::Failed => {
                    let snap = ctrl.snapshot();
                    anyhow::bail!(snap
                        .ingest
                        .error
                        .unwrap_or_else(|| crate::orchestrator::INGEST_FAILED.to_string()));
                }
                IngestOutcome::Stored => {
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "Ingested {line_count} line(s) for {service}"
                    )));
                }
            }
            // Ingestion already succeeded; a failed refresh is only reported.
            let logs = ctrl.snapshot().logs;
            match logs.error {
                Some(err) => {
                    let _ = out_tx.send(OutputLine::Stderr(err));
                }
                None => print_logs(args, &logs.data, out_tx)?,
            }
        }
        Command::Analyze => {
            ctrl.analyze_logs().await;
            let analysis = ctrl.snapshot().analysis;
            if let Some(err) = analysis.error {
                anyhow::bail!(err);
            }
            if let Some(result) = analysis.data {
                if args.json {
                    let out = serde_json::to_string_pretty(&result)?;
                    let _ = out_tx.send(OutputLine::Stdout(out));
                } else {
                    for line in crate::text_summary::build_analysis_summary(&result).lines {
                        let _ = out_tx.send(OutputLine::Stdout(line));
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_logs(
    args: &Cli,
    entries: &[crate::model::LogEntry],
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    if args.json {
        let out = serde_json::to_string_pretty(entries)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        for line in crate::text_summary::build_logs_summary(entries).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_open_tui_against_local_backend() {
        let cli = Cli::try_parse_from(["log-intel"]).unwrap();
        assert_eq!(cli.command, None);
        let cfg = build_config(&cli);
        assert_eq!(cfg.base_url, "http://localhost:8080");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(cfg.user_agent.starts_with("log-intel/"));
    }

    #[test]
    fn ingest_accepts_service_file_and_global_flags() {
        let cli = Cli::try_parse_from([
            "log-intel",
            "ingest",
            "--service",
            "PaymentService",
            "app.log",
            "--json",
            "--timeout",
            "5s",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(build_config(&cli).timeout, Duration::from_secs(5));
        assert_eq!(
            cli.command,
            Some(Command::Ingest {
                service: "PaymentService".into(),
                file: Some(PathBuf::from("app.log")),
            })
        );
    }

    #[test]
    fn ingest_service_defaults_to_order_service() {
        let cli = Cli::try_parse_from(["log-intel", "ingest"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Ingest {
                service: DEFAULT_SERVICE_NAME.into(),
                file: None,
            })
        );
    }

    #[test]
    fn reads_raw_text_from_file() {
        let path = std::env::temp_dir().join(format!("log-intel-cli-{}.log", std::process::id()));
        std::fs::write(&path, "a\n\n b \n").unwrap();
        let raw = read_raw_text(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(normalize_lines(&raw), vec!["a", "b"]);
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let err = read_raw_text(Some(Path::new("/definitely/not/here.log"))).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.log"));
    }

    #[test]
    fn invalid_base_url_fails_controller_setup() {
        let cli = Cli::try_parse_from(["log-intel", "list", "--base-url", "::nope::"]).unwrap();
        assert!(build_controller(&cli).is_err());
    }
}

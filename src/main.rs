//! CLI entry point for paperscout.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info, warn};

mod app;
mod app_config;
mod cli;
mod commands;

use app::config_runtime;
use cli::{Cli, Command};

/// Process exit outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Everything requested was done.
    Success,
    /// Some items failed, others succeeded.
    Partial,
    /// Nothing useful was produced.
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Partial => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    app::terminal::init_tracing(config_runtime::resolve_default_log_level(cli.common()));
    debug!(?cli, "CLI arguments parsed");

    match run(cli).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            error!("paperscout failed: {e:#}");
            ProcessExit::Failure.into()
        }
    }
}

async fn run(cli: Cli) -> Result<ProcessExit> {
    let common = cli.common().clone();
    let loaded = app_config::load_config(common.config.as_deref())?;
    if loaded.loaded_from_file
        && let Some(path) = &loaded.path
    {
        debug!(path = %path.display(), "loaded config file");
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    spawn_interrupt_listener(Arc::clone(&interrupted));

    match &cli.command {
        Some(Command::Analyze(args)) => {
            let settings = config_runtime::resolve_analyze_settings(args, &loaded);
            commands::run_analyze_command(&settings, common.quiet, interrupted).await
        }
        None => {
            let settings = config_runtime::resolve_retrieve_settings(&cli.retrieve, &loaded);
            commands::run_retrieve_command(&settings, common.quiet, interrupted).await
        }
    }
}

/// First Ctrl-C stops new work; in-flight items finish and partial results are kept.
fn spawn_interrupt_listener(interrupted: Arc<AtomicBool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, finishing in-flight work");
                interrupted.store(true, Ordering::SeqCst);
            }
            Err(e) => warn!(error = %e, "could not listen for Ctrl-C"),
        }
    });
}

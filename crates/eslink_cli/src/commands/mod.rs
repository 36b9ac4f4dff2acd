//! Command implementations

mod debug;
mod fix;
mod lint;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::{IntoDiagnostic, Result, WrapErr};
use tokio::process::Command;
use tokio::runtime::Runtime;
use tracing::debug;

use eslink_core::Settings;
use eslink_session::{Dispatcher, ProjectRoots, SessionController};

use crate::cli::Cli;
use crate::document::ConsoleNotifier;

pub use debug::run_debug;
pub use fix::run_fix;
pub use lint::run_lint;

const WORKER_NAME: &str = "eslink-worker";

pub fn create_tokio_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}

/// Absolute, symlink-free form of a path given on the command line.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot open {}", path.display()))
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    match &cli.settings {
        Some(path) => Settings::from_file(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

/// Finds the worker binary: `--worker`, then next to this executable, then
/// `PATH`.
fn locate_worker(cli: &Cli) -> Result<PathBuf> {
    if let Some(path) = &cli.worker {
        return Ok(path.clone());
    }

    let name = format!("{}{}", WORKER_NAME, std::env::consts::EXE_SUFFIX);
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let candidate = dir.join(&name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    which::which(WORKER_NAME)
        .into_diagnostic()
        .wrap_err("eslink-worker not found; pass --worker")
}

/// Starts a worker and a session around it. Must run inside a runtime.
pub fn start_session(cli: &Cli) -> Result<SessionController> {
    let settings = load_settings(cli)?;
    let worker = locate_worker(cli)?;
    debug!("Using worker {}", worker.display());

    let mut command = Command::new(&worker);
    command.env("ESLINK_LOG", if cli.verbose { "debug" } else { "warn" });
    let dispatcher = Dispatcher::spawn_command(command)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to start {}", worker.display()))?;

    let projects = match &cli.project {
        Some(root) => ProjectRoots::new([absolute(root)?]),
        None => ProjectRoots::default(),
    };
    Ok(SessionController::new(
        dispatcher,
        settings,
        Arc::new(ConsoleNotifier),
        projects,
    ))
}

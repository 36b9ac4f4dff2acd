//! eslink worker process
//!
//! Reads jobs on stdin and answers on stdout. Logs go to stderr so they never
//! interleave with protocol output.

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use eslink_core::{EslintFactory, JobExecutor};
use eslink_worker::Worker;
use eslink_worker::shutdown::shutdown_signal;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "ESLINK_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    info!("eslink worker {} started", env!("CARGO_PKG_VERSION"));
    let worker = Worker::new(JobExecutor::new(EslintFactory));

    tokio::select! {
        result = worker.serve(tokio::io::stdin(), tokio::io::stdout()) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Worker I/O failed: {}", e);
                ExitCode::from(2)
            }
        },
        _ = shutdown_signal() => ExitCode::SUCCESS,
    }
}

//! eslink worker
//!
//! The long-lived process that executes jobs. It reads one
//! [`WorkerRequest`] per line, runs it to completion and writes exactly one
//! [`WorkerEvent`] per line before reading the next request. A job that
//! fails, or panics, becomes a rejected event; the loop keeps serving until
//! its input closes.

pub mod shutdown;

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use eslink_core::JobExecutor;
use eslink_core::protocol::{FailureKind, JobFailure, WorkerEvent, WorkerRequest};

/// Serves jobs over a line-delimited JSON stream.
#[derive(Clone)]
pub struct Worker {
    executor: Arc<JobExecutor>,
}

impl Worker {
    /// Creates a worker around an executor.
    pub fn new(executor: JobExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    /// Runs until `reader` reaches end of input.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let event = self.handle_line(&line).await;
            let mut payload = serde_json::to_vec(&event)?;
            payload.push(b'\n');
            writer.write_all(&payload).await?;
            writer.flush().await?;
        }

        info!("Job input closed, worker stopping");
        Ok(())
    }

    /// Handles one request line and produces its single event.
    pub async fn handle_line(&self, line: &str) -> WorkerEvent {
        let request: WorkerRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                let id = recover_id(line);
                warn!("Malformed job request {}: {}", id, e);
                return WorkerEvent::rejected(
                    id,
                    JobFailure::new(FailureKind::Internal, format!("malformed job: {}", e)),
                );
            }
        };

        let id = request.id;
        let kind = request.job.kind;
        debug!(
            "Job {} ({:?}) for {}",
            id,
            kind,
            request.job.file_path.display()
        );

        let executor = Arc::clone(&self.executor);
        let started = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || executor.execute(&request.job)).await;

        match outcome {
            Ok(Ok(response)) => {
                debug!("Job {} done in {:?}", id, started.elapsed());
                WorkerEvent::resolved(id, response)
            }
            Ok(Err(e)) => {
                warn!("Job {} ({:?}) failed: {}", id, kind, e);
                WorkerEvent::rejected(id, JobFailure::from(&e))
            }
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    "job was cancelled".to_string()
                };
                error!("Job {} ({:?}) panicked: {}", id, kind, message);
                WorkerEvent::rejected(
                    id,
                    JobFailure::new(
                        FailureKind::EngineRuntime,
                        format!("worker job crashed: {}", message),
                    ),
                )
            }
        }
    }
}

fn recover_id(line: &str) -> u64 {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|value| value.get("id").and_then(|id| id.as_u64()))
        .unwrap_or(0)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

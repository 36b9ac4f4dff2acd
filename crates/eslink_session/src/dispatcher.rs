//! Request/response correlation with the worker process.
//!
//! The [`Dispatcher`] writes one [`WorkerRequest`] per line to the worker
//! and parks a oneshot sender in a single pending slot. A reader task owns
//! the worker's output and hands the event whose id matches the slot to the
//! waiting caller. Events nobody is waiting for, such as the late reply to a
//! job that timed out, are discarded.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use eslink_core::protocol::{RESPONSE_EVENT, WorkerEvent, WorkerRequest};
use eslink_core::{Job, JobResponse};

use crate::error::DispatchError;

/// How long a job may run before [`Dispatcher::send`] gives up on it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type PendingSlot = Arc<Mutex<Option<(u64, oneshot::Sender<WorkerEvent>)>>>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Sends jobs to one worker, one at a time.
pub struct Dispatcher {
    writer: tokio::sync::Mutex<Option<BoxedWriter>>,
    pending: PendingSlot,
    busy: AtomicBool,
    terminated: Arc<AtomicBool>,
    next_id: AtomicU64,
    timeout: Duration,
    child: tokio::sync::Mutex<Option<Child>>,
    reader_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Launches the worker binary at `program`.
    pub fn spawn(program: impl AsRef<Path>) -> Result<Self, DispatchError> {
        Self::spawn_command(Command::new(program.as_ref()))
    }

    /// Launches a worker from a prepared command. Its stdin and stdout are
    /// replaced by the job channel; stderr is left to the caller.
    pub fn spawn_command(mut command: Command) -> Result<Self, DispatchError> {
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true);
        let mut child = command.spawn()?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(DispatchError::WorkerUnavailable);
        };
        info!("Started eslink worker (pid {:?})", child.id());

        Ok(Self::attach(stdout, stdin, Some(child)))
    }

    /// Attaches to a worker reachable through `reader` (its output) and
    /// `writer` (its input).
    pub fn connect<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::attach(reader, writer, None)
    }

    fn attach<R, W>(reader: R, writer: W, child: Option<Child>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let pending: PendingSlot = Arc::new(Mutex::new(None));
        let terminated = Arc::new(AtomicBool::new(false));
        let reader_handle = tokio::spawn(read_events(
            reader,
            Arc::clone(&pending),
            Arc::clone(&terminated),
        ));

        Self {
            writer: tokio::sync::Mutex::new(Some(Box::new(writer))),
            pending,
            busy: AtomicBool::new(false),
            terminated,
            next_id: AtomicU64::new(1),
            timeout: DEFAULT_TIMEOUT,
            child: tokio::sync::Mutex::new(child),
            reader_handle: Mutex::new(Some(reader_handle)),
        }
    }

    /// Sets the per-job timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the worker can no longer accept jobs.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Sends `job` and waits for its response.
    pub async fn send(&self, job: Job) -> Result<JobResponse, DispatchError> {
        if self.is_terminated() {
            return Err(DispatchError::WorkerUnavailable);
        }
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(DispatchError::Busy);
        }
        let _busy = BusyGuard(&self.busy);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.park(id, tx)?;

        if let Err(e) = self.write_request(id, job).await {
            self.pending.lock().take();
            return Err(e);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(event)) => Ok(event.into_result()?),
            Ok(Err(_)) => Err(DispatchError::WorkerUnavailable),
            Err(_) => {
                self.pending.lock().take();
                warn!("Job {} timed out after {:?}", id, self.timeout);
                Err(DispatchError::Timeout(self.timeout))
            }
        }
    }

    /// Stores the reply slot for job `id`.
    ///
    /// The reader may have exited since `send` checked; it clears the slot
    /// only after marking the worker terminated, so checking again here
    /// catches a slot nobody would answer.
    fn park(&self, id: u64, tx: oneshot::Sender<WorkerEvent>) -> Result<(), DispatchError> {
        let mut pending = self.pending.lock();
        *pending = Some((id, tx));
        if self.is_terminated() {
            pending.take();
            return Err(DispatchError::WorkerUnavailable);
        }
        Ok(())
    }

    async fn write_request(&self, id: u64, job: Job) -> Result<(), DispatchError> {
        let mut line = serde_json::to_vec(&WorkerRequest { id, job })?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        let Some(writer) = writer.as_mut() else {
            return Err(DispatchError::WorkerUnavailable);
        };
        writer.write_all(&line).await?;
        writer.flush().await?;
        debug!("Sent job {}", id);
        Ok(())
    }

    /// Tears the worker down. Later sends fail with
    /// [`DispatchError::WorkerUnavailable`].
    pub async fn terminate(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Terminating eslink worker");

        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
        self.pending.lock().take();
        if let Some(handle) = self.reader_handle.lock().take() {
            handle.abort();
        }
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to kill eslink worker: {}", e);
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Some(handle) = self.reader_handle.lock().take() {
            handle.abort();
        }
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn read_events<R>(reader: R, pending: PendingSlot, terminated: Arc<AtomicBool>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<WorkerEvent>(&line) {
                    Ok(event) if event.event == RESPONSE_EVENT => deliver(&pending, event),
                    Ok(event) => debug!("Ignoring worker event {:?}", event.event),
                    Err(e) => warn!("Ignoring malformed worker output: {}", e),
                }
            }
            Ok(None) => {
                info!("eslink worker closed its output");
                break;
            }
            Err(e) => {
                warn!("Failed to read from eslink worker: {}", e);
                break;
            }
        }
    }
    terminated.store(true, Ordering::Release);
    pending.lock().take();
}

fn deliver(pending: &Mutex<Option<(u64, oneshot::Sender<WorkerEvent>)>>, event: WorkerEvent) {
    let mut slot = pending.lock();
    match slot.take() {
        Some((id, tx)) if id == event.id => {
            if tx.send(event).is_err() {
                debug!("Caller of job {} went away", id);
            }
        }
        waiting => {
            *slot = waiting;
            debug!("Discarding response {} with no waiting job", event.id);
        }
    }
}

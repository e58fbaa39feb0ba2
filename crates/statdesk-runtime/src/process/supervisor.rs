//! Backend process supervisor.
//!
//! The `BackendSupervisor` owns the single backend child process. The child
//! itself lives inside a watcher task; the supervisor keeps a handle with a
//! cancellation token (stop request) and the task's join handle (exit).
//!
//! Key design decisions:
//! - **One process at a time**: `start` refuses while a child is alive
//! - **Idempotent stop**: stopping an exited or never-started backend is `Ok(None)`
//! - **Observers, not callbacks**: lines go to log sinks, lifecycle changes
//!   to a broadcast channel, readiness to a watch channel
//! - **Probe-gated readiness**: only the HTTP probe moves readiness to `Ready`

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use statdesk_core::{BackendConfig, BackendLogSinkPort, OutputStream, ReadinessState};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::SupervisorError;
use super::events::{BackendEvent, BackendExit};
use super::logs::BackendLog;
use super::plan::LaunchPlan;
use super::shutdown::{GRACE_PERIOD, shutdown_child};
use super::stream::{BannerSignal, spawn_stream_reader};
use crate::health::ReadinessProbe;

/// Upper bound on `stop`, covering the SIGTERM grace period and reaping.
const STOP_TIMEOUT: Duration = Duration::from_secs(GRACE_PERIOD.as_secs() + 2);

/// How long to wait for the stream readers to drain after exit.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

const EVENT_CAPACITY: usize = 64;

/// Snapshot of the live backend process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningBackend {
    pub pid: u32,
    pub program: PathBuf,
    pub started_at: DateTime<Utc>,
}

struct BackendHandle {
    info: RunningBackend,
    /// Cancelled to request a stop.
    cancel: CancellationToken,
    /// Watcher task; resolves once the child has been reaped.
    join: JoinHandle<BackendExit>,
}

/// Supervises the backend child process.
pub struct BackendSupervisor {
    port: u16,
    ready_banner: String,
    ready_timeout: Duration,
    probe_interval: Duration,
    handle: Mutex<Option<BackendHandle>>,
    log: Arc<BackendLog>,
    sinks: Vec<Arc<dyn BackendLogSinkPort>>,
    events: broadcast::Sender<BackendEvent>,
    readiness: watch::Sender<ReadinessState>,
    last_exit: watch::Sender<Option<BackendExit>>,
    banner_seen: Arc<AtomicBool>,
}

impl BackendSupervisor {
    pub fn new(config: &BackendConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (readiness, _) = watch::channel(ReadinessState::NotStarted);
        let (last_exit, _) = watch::channel(None);
        Self {
            port: config.port,
            ready_banner: config.ready_banner.clone(),
            ready_timeout: config.ready_timeout,
            probe_interval: config.probe_interval,
            handle: Mutex::new(None),
            log: Arc::new(BackendLog::new()),
            sinks: Vec::new(),
            events,
            readiness,
            last_exit,
            banner_seen: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Forward every backend line to `sink` as well.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn BackendLogSinkPort>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Spawn the backend described by `plan`.
    ///
    /// Returns the child's pid. The child inherits the parent environment
    /// with `plan.env` layered on top.
    pub async fn start(&self, plan: &LaunchPlan) -> Result<u32, SupervisorError> {
        let mut guard = self.handle.lock().await;

        if let Some(old) = guard.take() {
            if !old.join.is_finished() {
                let pid = old.info.pid;
                *guard = Some(old);
                return Err(SupervisorError::AlreadyRunning(pid));
            }
            if let Err(e) = old.join.await {
                warn!("Previous backend watcher ended abnormally: {e}");
            }
        }

        let mut command = Command::new(&plan.program);
        command
            .args(&plan.args)
            .current_dir(&plan.cwd)
            .envs(&plan.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group; shutdown signals the whole group
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|source| {
                error!(program = %plan.program.display(), error = %source, "Failed to launch backend");
                SupervisorError::LaunchFailure {
                    program: plan.program.clone(),
                    source,
                }
            })?;

        let pid = child
            .id()
            .ok_or_else(|| SupervisorError::Internal("Spawned backend has no pid".into()))?;

        self.log.clear();
        self.banner_seen.store(false, Ordering::SeqCst);
        self.last_exit.send_replace(None);
        self.readiness.send_modify(|state| {
            *state = if *state == ReadinessState::NotStarted {
                state.advance(ReadinessState::Starting)
            } else {
                state.restarted()
            };
        });

        info!(
            pid,
            program = %plan.program.display(),
            cwd = %plan.cwd.display(),
            "Backend started"
        );
        // Published before the watcher exists so it always precedes `Exited`
        let _ = self.events.send(BackendEvent::Started { pid });

        let readers = self.spawn_readers(&mut child);
        let cancel = CancellationToken::new();
        let join = tokio::spawn(watch_backend(Watcher {
            child,
            pid,
            cancel: cancel.clone(),
            readers,
            log: Arc::clone(&self.log),
            events: self.events.clone(),
            last_exit: self.last_exit.clone(),
        }));

        *guard = Some(BackendHandle {
            info: RunningBackend {
                pid,
                program: plan.program.clone(),
                started_at: Utc::now(),
            },
            cancel,
            join,
        });

        Ok(pid)
    }

    fn spawn_readers(&self, child: &mut Child) -> Vec<JoinHandle<()>> {
        let mut sinks: Vec<Arc<dyn BackendLogSinkPort>> =
            vec![Arc::clone(&self.log) as Arc<dyn BackendLogSinkPort>];
        sinks.extend(self.sinks.iter().cloned());
        let banner = BannerSignal::new(
            &self.ready_banner,
            Arc::clone(&self.banner_seen),
            self.events.clone(),
        );

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_stream_reader(
                stdout,
                OutputStream::Stdout,
                sinks.clone(),
                Some(banner.clone()),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_stream_reader(
                stderr,
                OutputStream::Stderr,
                sinks,
                Some(banner),
            ));
        }
        readers
    }

    /// Stop the backend if it is running.
    ///
    /// Returns the exit for a stop that actually ended a process, `None` when
    /// nothing was running. Safe to call repeatedly.
    pub async fn stop(&self) -> Result<Option<BackendExit>, SupervisorError> {
        let Some(handle) = self.handle.lock().await.take() else {
            debug!("Stop requested with no backend running");
            return Ok(None);
        };

        if handle.join.is_finished() {
            debug!(pid = handle.info.pid, "Backend already exited");
            let _ = handle.join.await;
            return Ok(None);
        }

        info!(pid = handle.info.pid, "Stopping backend");
        handle.cancel.cancel();

        let mut join = handle.join;
        match timeout(STOP_TIMEOUT, &mut join).await {
            Ok(Ok(exit)) => Ok(Some(exit)),
            Ok(Err(join_err)) => {
                error!("Backend watcher panicked: {join_err}");
                Err(SupervisorError::Internal(format!(
                    "Backend watcher panicked: {join_err}"
                )))
            }
            Err(_) => {
                // Dropping the task drops the child, which kills it
                warn!("Backend stop timed out; aborting watcher");
                join.abort();
                Err(SupervisorError::Internal(
                    "Backend stop timed out; watcher aborted".into(),
                ))
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.join.is_finished())
    }

    pub async fn running(&self) -> Option<RunningBackend> {
        self.handle
            .lock()
            .await
            .as_ref()
            .filter(|h| !h.join.is_finished())
            .map(|h| h.info.clone())
    }

    pub async fn pid(&self) -> Option<u32> {
        self.running().await.map(|r| r.pid)
    }

    /// Lifecycle events for every launch made by this supervisor.
    pub fn subscribe(&self) -> broadcast::Receiver<BackendEvent> {
        self.events.subscribe()
    }

    pub fn readiness(&self) -> ReadinessState {
        *self.readiness.borrow()
    }

    pub fn watch_readiness(&self) -> watch::Receiver<ReadinessState> {
        self.readiness.subscribe()
    }

    /// Whether the startup banner appeared since the last launch.
    pub fn banner_seen(&self) -> bool {
        self.banner_seen.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Arc<BackendLog> {
        Arc::clone(&self.log)
    }

    /// Exit of the most recent process, once it has ended.
    pub fn last_exit(&self) -> Option<BackendExit> {
        self.last_exit.borrow().clone()
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the current process to end.
    ///
    /// Returns immediately with the last exit when nothing is running.
    pub async fn wait_for_exit(&self) -> Result<BackendExit, SupervisorError> {
        let mut rx = self.last_exit.subscribe();
        if !self.is_running().await {
            return self.last_exit().ok_or(SupervisorError::NotRunning);
        }

        let exit = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| SupervisorError::Internal("Exit channel closed".into()))?
            .clone();
        exit.ok_or_else(|| SupervisorError::Internal("Exit channel closed".into()))
    }

    /// Poll `GET /` on the backend port until it answers 200.
    ///
    /// Bounded by the configured ready timeout. A timeout leaves the process
    /// running; an exit while waiting ends the wait early.
    pub async fn wait_until_ready(&self) -> Result<(), SupervisorError> {
        let mut exit_rx = self.last_exit.subscribe();
        if !self.is_running().await {
            return Err(SupervisorError::NotRunning);
        }

        let probe = ReadinessProbe::for_port(self.port, self.probe_interval);
        let timeout_secs = self.ready_timeout.as_secs();
        info!(url = %probe.url(), timeout_secs, "Waiting for backend readiness");

        tokio::select! {
            ready = probe.wait(self.ready_timeout) => {
                if ready {
                    self.readiness
                        .send_modify(|state| *state = state.advance(ReadinessState::Ready));
                    let _ = self.events.send(BackendEvent::Ready);
                    info!(url = %probe.url(), "Backend is ready");
                    Ok(())
                } else {
                    warn!(
                        url = %probe.url(),
                        timeout_secs,
                        "Backend did not become ready in time; leaving it running"
                    );
                    Err(SupervisorError::ReadinessTimeout {
                        url: probe.url().to_string(),
                        timeout_secs,
                    })
                }
            }
            status = async {
                let exit = exit_rx.wait_for(Option::is_some).await.ok().and_then(|exit| exit.clone());
                exit.map(|exit| exit.status_text())
            } => {
                let status = status.unwrap_or_else(|| "unknown status".to_string());
                warn!(%status, "Backend exited while waiting for readiness");
                Err(SupervisorError::ExitedBeforeReady { status })
            }
        }
    }
}

impl Drop for BackendSupervisor {
    fn drop(&mut self) {
        // Best effort: ask the watcher to shut the child down
        if let Ok(mut guard) = self.handle.try_lock() {
            if let Some(handle) = guard.take() {
                handle.cancel.cancel();
            }
        }
    }
}

impl fmt::Debug for BackendSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSupervisor")
            .field("port", &self.port)
            .field("readiness", &self.readiness())
            .finish_non_exhaustive()
    }
}

struct Watcher {
    child: Child,
    pid: u32,
    cancel: CancellationToken,
    readers: Vec<JoinHandle<()>>,
    log: Arc<BackendLog>,
    events: broadcast::Sender<BackendEvent>,
    last_exit: watch::Sender<Option<BackendExit>>,
}

/// Owns the child until it ends, then publishes the exit.
async fn watch_backend(mut watcher: Watcher) -> BackendExit {
    let (status, requested) = tokio::select! {
        status = watcher.child.wait() => (status, watcher.cancel.is_cancelled()),
        () = watcher.cancel.cancelled() => (shutdown_child(&mut watcher.child).await, true),
    };

    for reader in watcher.readers {
        if timeout(READER_DRAIN_TIMEOUT, reader).await.is_err() {
            debug!(pid = watcher.pid, "Backend output still open after exit; not waiting");
        }
    }

    let exit = build_exit(watcher.pid, status, requested, &watcher.log);
    report_exit(&exit);

    watcher.last_exit.send_replace(Some(exit.clone()));
    let _ = watcher.events.send(BackendEvent::Exited(exit.clone()));
    exit
}

fn build_exit(
    pid: u32,
    status: io::Result<ExitStatus>,
    requested: bool,
    log: &BackendLog,
) -> BackendExit {
    let (code, signal) = match status {
        Ok(status) => (status.code(), exit_signal(status)),
        Err(e) => {
            error!(pid, error = %e, "Failed to collect backend exit status");
            (None, None)
        }
    };
    BackendExit {
        pid,
        code,
        signal,
        requested,
        recent_output: log.recent(),
    }
}

#[cfg(unix)]
fn exit_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
const fn exit_signal(_status: ExitStatus) -> Option<i32> {
    None
}

fn report_exit(exit: &BackendExit) {
    if exit.is_failure() {
        let output: Vec<String> = exit.recent_output.iter().map(ToString::to_string).collect();
        error!(
            pid = exit.pid,
            status = %exit.status_text(),
            "Backend exited unexpectedly. Recent output:\n{}",
            output.join("\n")
        );
    } else if exit.requested {
        info!(pid = exit.pid, status = %exit.status_text(), "Backend stopped");
    } else {
        info!(pid = exit.pid, "Backend exited cleanly");
    }
}

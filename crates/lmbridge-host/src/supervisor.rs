//! Server lifecycle supervisor.
//!
//! Owns the listener state machine (Stopped, Starting, Running, Stopping)
//! internally; adapters call methods on the supervisor without holding
//! handles themselves. Binding happens FIRST, with sequential port retry,
//! and the real bound address is what status reports. Model attachment is
//! decoupled from bind success: the listener can be up before an engine is
//! attached.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use lmbridge_core::ports::{InferenceRuntime, LogSink};
use lmbridge_core::settings::{ServerSettings, SettingsError};
use lmbridge_core::status::{LogLevel, ServerLog, ServiceState, ServiceStatus};
use lmbridge_server::state::{RuntimeSlot, ServerContext, SharedState};

use crate::logs::LogRing;
use crate::retry::{self, RetryPolicy};

/// Ports tried on a bind conflict: `base_port .. base_port + PORT_ATTEMPTS`.
pub const PORT_ATTEMPTS: u32 = 10;

/// Delay between bind attempts when the address is in use.
pub const PORT_RETRY_DELAY: Duration = Duration::from_millis(300);

/// How long `stop` waits before aborting the server task.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval of the status refresh loop.
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Broadcast capacity for status snapshots.
const STATUS_CHANNEL_CAPACITY: usize = 64;

/// Handle to a running server.
struct ServerHandle {
    /// Cancellation token for graceful shutdown.
    cancel: CancellationToken,
    /// Join handle for the serve task.
    join: JoinHandle<anyhow::Result<()>>,
    /// Join handle for the status refresh loop.
    refresh: JoinHandle<()>,
    /// Address the listener is bound to.
    bound_addr: SocketAddr,
    /// Shared state polled for busy flag and counters.
    context: SharedState,
}

/// Errors from supervisor operations.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// Server is already running.
    #[error("server is already running on {0}")]
    AlreadyRunning(SocketAddr),

    /// All bind attempts failed.
    #[error("failed to bind {address}: {reason}")]
    BindFailed { address: String, reason: String },

    /// Settings failed validation.
    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),

    /// Server is not running.
    #[error("server is not running")]
    NotRunning,

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Supervisor for the lmbridge listener.
///
/// Owns the `ServiceStatus` and the operational log ring; observers get
/// read-only snapshots via [`status`](Self::status) or the broadcast
/// subscriptions, never a mutable handle.
pub struct ServerSupervisor {
    /// Internal handle, protected by an async mutex.
    handle: Mutex<Option<ServerHandle>>,
    /// Explicit lifecycle state.
    state: StdMutex<ServiceState>,
    /// Operational log ring, shared with the server as its log sink.
    log: Arc<LogRing>,
    /// Status snapshot fan-out, fed by the refresh loop.
    status_tx: broadcast::Sender<ServiceStatus>,
    /// Attachable inference runtime, shared with the server context.
    runtime: RuntimeSlot,
}

impl Default for ServerSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerSupervisor {
    /// Create a supervisor with an empty log ring and no runtime attached.
    #[must_use]
    pub fn new() -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            handle: Mutex::new(None),
            state: StdMutex::new(ServiceState::Stopped),
            log: Arc::new(LogRing::new()),
            status_tx,
            runtime: RuntimeSlot::default(),
        }
    }

    /// Attach an inference engine. May happen before or after `start`;
    /// requests arriving without one answer `model_not_initialized`.
    pub fn attach_runtime(&self, runtime: Arc<dyn InferenceRuntime>) {
        self.runtime.attach(runtime);
        self.log
            .push(ServerLog::new(LogLevel::Success, "inference runtime attached"));
    }

    /// Detach the current engine, if any.
    pub fn detach_runtime(&self) {
        self.runtime.detach();
        self.log
            .push(ServerLog::new(LogLevel::Info, "inference runtime detached"));
    }

    /// Start the listener.
    ///
    /// Binds sequentially on `settings.port .. settings.port + 9`; an
    /// address-in-use failure waits [`PORT_RETRY_DELAY`] and tries the next
    /// candidate, any other bind failure aborts immediately. Returns the
    /// real bound address.
    ///
    /// # Errors
    ///
    /// Fails when already running, on invalid settings, or when every bind
    /// attempt is exhausted. A failed start leaves the state `Stopped` and
    /// never tears down the host process.
    pub async fn start(&self, settings: ServerSettings) -> Result<SocketAddr, SupervisorError> {
        let mut guard = self.handle.lock().await;

        if let Some(old) = guard.take() {
            if !old.join.is_finished() {
                let addr = old.bound_addr;
                *guard = Some(old);
                return Err(SupervisorError::AlreadyRunning(addr));
            }
            old.refresh.abort();
            match old.join.await {
                Ok(Ok(())) => debug!("previous server task completed normally"),
                Ok(Err(err)) => warn!("previous server task ended with error: {err}"),
                Err(err) => warn!("previous server task panicked: {err}"),
            }
        }

        settings.validate()?;
        self.set_state(ServiceState::Starting);
        self.log.push(ServerLog::new(
            LogLevel::Info,
            format!("starting server for model '{}'", settings.model_name),
        ));

        let listener = match self.bind_with_retry(&settings).await {
            Ok(listener) => listener,
            Err(err) => {
                self.set_state(ServiceState::Stopped);
                let failure = SupervisorError::BindFailed {
                    address: format!("{}:{}", settings.host, settings.port),
                    reason: err.to_string(),
                };
                error!("{failure}");
                self.log
                    .push(ServerLog::new(LogLevel::Error, failure.to_string()));
                let _ = self
                    .status_tx
                    .send(ServiceStatus::stopped(self.log.snapshot()));
                return Err(failure);
            }
        };

        let bound_addr = listener
            .local_addr()
            .map_err(|err| SupervisorError::Internal(format!("failed to read local address: {err}")))?;

        let sink: Arc<dyn LogSink> = self.log.clone();
        let context = ServerContext::new(settings.model_name, self.runtime.clone(), sink);

        let cancel = CancellationToken::new();
        let serve_cancel = cancel.clone();
        let serve_context = context.clone();
        let join: JoinHandle<anyhow::Result<()>> = tokio::spawn(async move {
            lmbridge_server::serve(listener, serve_context, serve_cancel).await
        });

        let refresh = tokio::spawn(refresh_loop(
            context.clone(),
            self.log.clone(),
            self.status_tx.clone(),
            bound_addr,
            cancel.clone(),
        ));

        self.set_state(ServiceState::Running);
        info!("server listening on {bound_addr}");
        self.log.push(ServerLog::new(
            LogLevel::Success,
            format!("listening on {bound_addr}"),
        ));

        *guard = Some(ServerHandle {
            cancel,
            join,
            refresh,
            bound_addr,
            context,
        });

        Ok(bound_addr)
    }

    /// Stop the listener: cancel, wait (bounded), reset counters.
    ///
    /// # Errors
    ///
    /// Fails when not running, or when the server task errored, panicked
    /// or had to be aborted. The state is `Stopped` afterwards either way.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        let mut guard = self.handle.lock().await;

        let Some(handle) = guard.take() else {
            return Err(SupervisorError::NotRunning);
        };

        self.set_state(ServiceState::Stopping);
        info!("stopping server on {}", handle.bound_addr);
        self.log.push(ServerLog::new(
            LogLevel::Info,
            format!("stopping server on {}", handle.bound_addr),
        ));

        handle.cancel.cancel();
        handle.refresh.abort();

        // Keep ownership of the join handle so we can abort on timeout.
        let mut join = handle.join;
        let result = match tokio::time::timeout(STOP_TIMEOUT, &mut join).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(err))) => {
                error!("server task ended with error: {err}");
                Err(SupervisorError::Internal(format!("server error: {err}")))
            }
            Ok(Err(join_err)) => {
                error!("server task panicked: {join_err}");
                Err(SupervisorError::Internal(format!(
                    "server task panicked: {join_err}"
                )))
            }
            Err(_) => {
                warn!("server stop timed out; aborting task");
                join.abort();
                Err(SupervisorError::Internal(
                    "server stop timed out; task aborted".to_string(),
                ))
            }
        };

        self.set_state(ServiceState::Stopped);
        self.log
            .push(ServerLog::new(LogLevel::Info, "server stopped"));
        let _ = self
            .status_tx
            .send(ServiceStatus::stopped(self.log.snapshot()));

        result
    }

    /// Current status snapshot.
    ///
    /// A server task that finished without cancellation is treated as
    /// crashed: logged, cleaned up, and reported as stopped.
    pub async fn status(&self) -> ServiceStatus {
        let mut guard = self.handle.lock().await;

        let Some(handle) = guard.as_ref() else {
            return self.stopped_status();
        };

        if handle.join.is_finished() {
            let was_cancelled = handle.cancel.is_cancelled();
            if let Some(dead) = guard.take() {
                dead.refresh.abort();
            }
            self.set_state(ServiceState::Stopped);
            if !was_cancelled {
                warn!("server task ended unexpectedly");
                self.log.push(ServerLog::new(
                    LogLevel::Error,
                    "server task ended unexpectedly",
                ));
            }
            return self.stopped_status();
        }

        running_status(&handle.context, &self.log, handle.bound_addr)
    }

    /// The bound address while running.
    pub async fn bound_address(&self) -> Option<SocketAddr> {
        let guard = self.handle.lock().await;
        guard.as_ref().and_then(|handle| {
            if handle.join.is_finished() {
                None
            } else {
                Some(handle.bound_addr)
            }
        })
    }

    /// Subscribe to status snapshots (refreshed every second while running).
    #[must_use]
    pub fn subscribe_status(&self) -> broadcast::Receiver<ServiceStatus> {
        self.status_tx.subscribe()
    }

    /// Subscribe to operational log entries.
    #[must_use]
    pub fn subscribe_logs(&self) -> broadcast::Receiver<ServerLog> {
        self.log.subscribe()
    }

    /// Snapshot of the operational log ring.
    #[must_use]
    pub fn logs(&self) -> Vec<ServerLog> {
        self.log.snapshot()
    }

    fn set_state(&self, state: ServiceState) {
        if let Ok(mut slot) = self.state.lock() {
            *slot = state;
        }
    }

    fn current_state(&self) -> ServiceState {
        self.state.lock().map_or(ServiceState::Stopped, |s| *s)
    }

    fn stopped_status(&self) -> ServiceStatus {
        let mut status = ServiceStatus::stopped(self.log.snapshot());
        status.state = self.current_state();
        status
    }

    /// Sequential bind over the candidate port range.
    ///
    /// Only "address in use" is retryable; everything else (permission
    /// denied, unresolvable host) aborts the loop immediately. Attempts are
    /// sequential, never concurrent, so attempted-port accounting stays
    /// deterministic.
    async fn bind_with_retry(&self, settings: &ServerSettings) -> io::Result<TcpListener> {
        let host = settings.host.clone();
        let base_port = settings.port;
        let log = self.log.clone();

        retry::with_policy(
            RetryPolicy {
                attempts: PORT_ATTEMPTS,
                delay: PORT_RETRY_DELAY,
            },
            move |attempt| {
                let host = host.clone();
                let log = log.clone();
                let candidate = base_port.saturating_add(attempt as u16);
                async move {
                    match TcpListener::bind((host.as_str(), candidate)).await {
                        Ok(listener) => Ok(listener),
                        Err(err) => {
                            if err.kind() == io::ErrorKind::AddrInUse {
                                warn!("port {candidate} in use, trying next candidate");
                                log.push(ServerLog::new(
                                    LogLevel::Warning,
                                    format!("port {candidate} in use, trying next candidate"),
                                ));
                            }
                            Err(err)
                        }
                    }
                }
            },
            |err: &io::Error| err.kind() == io::ErrorKind::AddrInUse,
        )
        .await
    }
}

impl std::fmt::Debug for ServerSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSupervisor")
            .field("state", &self.current_state())
            .finish_non_exhaustive()
    }
}

/// Build the status snapshot for a running server.
fn running_status(context: &ServerContext, log: &LogRing, addr: SocketAddr) -> ServiceStatus {
    ServiceStatus {
        state: ServiceState::Running,
        running: true,
        busy: context.admission.is_busy(),
        port: addr.port(),
        address: addr.ip().to_string(),
        requests_processed: context.admission.requests_processed(),
        uptime_seconds: context.uptime_seconds(),
        logs: log.snapshot(),
    }
}

/// Poll the shared state every second and fan snapshots out to observers.
async fn refresh_loop(
    context: SharedState,
    log: Arc<LogRing>,
    status_tx: broadcast::Sender<ServiceStatus>,
    addr: SocketAddr,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let _ = status_tx.send(running_status(&context, &log, addr));
            }
        }
    }
}

//! Daemon polling supervisor
//!
//! Drives a coin's daemon through a small state machine:
//!
//! ```text
//! Init ──ok──────────────────────────────► Polling
//!  │                                          ▲
//!  ├─rejected (auth/RPC error)──► Aborted     │
//!  ├─fail, no --start──► Aborted              │ first heartbeat
//!  └─fail, --start──► launch ──► AwaitingDaemon
//! ```
//!
//! Every tick issues exactly one `getinfo` through the registry. The next
//! tick is only awaited once the current call has returned, and ticks missed
//! while a slow call was in flight are delayed rather than bursted.
//! Cancellation arrives on a watch channel and is honored while waiting and
//! while a call is in flight.

use crate::daemon::DaemonProcess;
use crate::registry::{CoinRegistry, DispatchOutcome};
use sdk::{CoinCommand, CommandArgs, MnError, MnErrorExt, PathOverrides};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Supervisor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Init,
    AwaitingDaemon,
    Polling,
    Aborted,
}

/// Options for a `monitor` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Launch the daemon when it is not reachable at start
    pub start: bool,
    /// Time between two polls
    pub interval: Duration,
}

/// Counters collected over a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub heartbeats: u64,
    pub failures: u64,
    /// Failed polls that will not clear up without operator action
    pub unrecoverable: u64,
    pub launched_daemon: bool,
}

pub struct Supervisor {
    registry: Arc<CoinRegistry>,
    coin: String,
    overrides: PathOverrides,
    options: MonitorOptions,
    state: SupervisorState,
    launched: Option<DaemonProcess>,
    report: MonitorReport,
}

impl Supervisor {
    pub fn new(
        registry: Arc<CoinRegistry>,
        coin: impl Into<String>,
        overrides: PathOverrides,
        options: MonitorOptions,
    ) -> Self {
        Self {
            registry,
            coin: coin.into(),
            overrides,
            options,
            state: SupervisorState::Init,
            launched: None,
            report: MonitorReport::default(),
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Run until `shutdown` flips to `true` (or its sender goes away)
    ///
    /// Returns early with `DaemonNotRunning` when the daemon is unreachable
    /// and auto-start is off, or `DaemonStartFailed` when the launch fails.
    /// A daemon that answers the first poll with an RPC or authorization
    /// error aborts the run with that error and is never launched twice.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<MonitorReport, MnError> {
        if self.state != SupervisorState::Init {
            return Err(MnError::InvalidArgument(
                "supervisor has already run".to_string(),
            ));
        }

        match self.poll_once().await {
            Ok(()) => {
                info!("{} daemon is running", self.coin);
                self.state = SupervisorState::Polling;
            }
            // The daemon answered, launching another one would not help
            Err(e) if daemon_answered(&e) => {
                warn!("{} daemon rejected getinfo: {}", self.coin, e);
                self.state = SupervisorState::Aborted;
                return Err(e);
            }
            Err(e) if !self.options.start => {
                warn!("Initial getinfo failed: {}", e);
                self.state = SupervisorState::Aborted;
                return Err(MnError::DaemonNotRunning(self.coin.clone()));
            }
            Err(e) => {
                warn!("Initial getinfo failed: {}", e);
                if let Err(e) = self.launch().await {
                    self.state = SupervisorState::Aborted;
                    return Err(e);
                }
                self.state = SupervisorState::AwaitingDaemon;
            }
        }

        let period = self.options.interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if is_cancelled(&shutdown) {
                break;
            }

            tokio::select! {
                _ = wait_cancelled(&mut shutdown) => break,
                _ = ticker.tick() => {}
            }

            debug!("Monitoring coin {}", self.coin);
            let outcome = tokio::select! {
                _ = wait_cancelled(&mut shutdown) => break,
                outcome = self.poll_once() => outcome,
            };

            match outcome {
                Ok(()) => {
                    if self.state == SupervisorState::AwaitingDaemon {
                        info!("{} daemon came up", self.coin);
                        self.state = SupervisorState::Polling;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    self.report.failures += 1;
                    warn!("{} daemon down? {}", self.coin, e);
                }
                Err(e) => {
                    self.report.failures += 1;
                    self.report.unrecoverable += 1;
                    error!("{} poll failed: {} ({})", self.coin, e, e.user_hint());
                }
            }
        }

        self.stop().await;
        Ok(self.report.clone())
    }

    async fn poll_once(&mut self) -> Result<(), MnError> {
        let outcome = self
            .registry
            .dispatch_command(
                &self.coin,
                CoinCommand::GetInfo,
                &self.overrides,
                &CommandArgs::None,
            )
            .await?;

        self.report.heartbeats += 1;
        match outcome {
            DispatchOutcome::DaemonInfo(details) if details.starting_up => {
                info!("Heartbeat: {} daemon is still starting up", self.coin)
            }
            _ => info!("Heartbeat: {} daemon is responding", self.coin),
        }
        Ok(())
    }

    async fn launch(&mut self) -> Result<(), MnError> {
        let paths = self
            .registry
            .resolve_paths(&self.coin, &self.overrides)
            .await?;
        info!("Trying to start {} daemon", self.coin);

        let process = DaemonProcess::spawn(&paths.daemon_bin.path, &[])?;
        info!("... started at {}", chrono::Local::now().to_rfc2822());
        self.launched = Some(process);
        self.report.launched_daemon = true;
        Ok(())
    }

    /// Enter `Aborted`; a daemon launched here that never answered is killed
    async fn stop(&mut self) {
        if self.state == SupervisorState::AwaitingDaemon {
            if let Some(mut process) = self.launched.take() {
                if let Err(e) = process.kill().await {
                    warn!("Failed to stop {}: {}", process.binary().display(), e);
                }
                // Forked grandchildren may keep the pipes open
                match time::timeout(DRAIN_GRACE, process.join_drain()).await {
                    Ok(Err(e)) => warn!("Daemon output drain failed: {}", e),
                    Err(_) => debug!("Daemon output still open, leaving drain behind"),
                    Ok(Ok(())) => {}
                }
            }
        }
        self.state = SupervisorState::Aborted;
        info!("Stopped monitoring {}", self.coin);
    }
}

fn daemon_answered(e: &MnError) -> bool {
    matches!(e, MnError::AuthorizationFailed | MnError::Rpc { .. })
}

fn is_cancelled(rx: &watch::Receiver<bool>) -> bool {
    *rx.borrow()
}

/// Resolves once cancellation is requested or the sender is gone
async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Create the cancellation channel used by `Supervisor::run`
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Flip `shutdown` on Ctrl-C, or SIGTERM on Unix
pub fn spawn_signal_handler(shutdown: watch::Sender<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown.send(true);
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

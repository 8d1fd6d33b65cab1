//! Foreground watcher for the `watch` command.
//!
//! Runs one [`SessionCoordinator`] for the employee's open work session until
//! one of these happens:
//!
//! - SIGTERM / SIGINT (Ctrl-C on Windows)
//! - the work session is closed elsewhere (checked every `session_check_secs`)
//!
//! In both cases the coordinator is destroyed before returning, which closes
//! an open idle break. A PID file lets `watch --stop` find the process.

use crate::libs::activity::ActivityMonitor;
use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::coordinator::{IdleSessionState, SessionCoordinator};
use crate::libs::data_storage::DataStorage;
use crate::libs::input::InputDeviceSource;
use crate::libs::messages::Message;
use crate::libs::policy::IdleState;
use crate::libs::services::Services;
use crate::libs::view::View;
use crate::{msg_bail_anyhow, msg_debug, msg_error, msg_error_anyhow, msg_info, msg_success, msg_warning};
use anyhow::Result;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const PID_FILE: &str = "idlewatch-watch.pid";

/// Why the watcher stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    SessionEnded,
}

/// Entry point of `idlewatch watch`.
pub async fn run_with_signal_handling(config: &Config) -> Result<()> {
    let employee_id = config.employee()?;
    let monitor_config = config.monitor();
    let services = backend::from_config(config)?;

    let session = match services.work_sessions.get_active_work_session(employee_id).await? {
        Some(session) => session,
        None => msg_bail_anyhow!(Message::NotClockedIn),
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(());
    });

    let monitor = ActivityMonitor::with_throttle(Arc::new(InputDeviceSource::new()), monitor_config.activity_throttle());
    let coordinator = SessionCoordinator::new(monitor, services.clone(), monitor_config.coordinator_options());
    coordinator.add_state_callback(state_reporter());
    coordinator.initialize(employee_id).await?;

    let pid_path = DataStorage::new().get_path(PID_FILE)?;
    std::fs::write(&pid_path, std::process::id().to_string())?;
    msg_info!(Message::WatcherStarted(std::process::id(), session.id));

    let shutdown = async {
        let _ = shutdown_rx.await;
    };
    let reason = watch(
        &coordinator,
        &services,
        employee_id,
        session.id,
        monitor_config.session_check_interval(),
        shutdown,
    )
    .await;

    if reason == StopReason::SessionEnded {
        msg_info!(Message::WorkSessionEnded(session.id));
    }

    if pid_path.exists() {
        let _ = std::fs::remove_file(&pid_path);
    }
    Ok(())
}

/// Waits for `shutdown` or the end of the work session, then destroys the
/// coordinator.
pub async fn watch<F>(
    coordinator: &SessionCoordinator,
    services: &Services,
    employee_id: i64,
    work_session_id: i64,
    check_interval: Duration,
    shutdown: F,
) -> StopReason
where
    F: Future<Output = ()>,
{
    let reason = tokio::select! {
        _ = shutdown => StopReason::Signal,
        _ = session_guard(services, employee_id, work_session_id, check_interval) => StopReason::SessionEnded,
    };

    coordinator.destroy().await;
    reason
}

/// Returns once `work_session_id` is no longer the employee's open session.
/// Failed checks are logged and retried on the next interval.
pub async fn session_guard(services: &Services, employee_id: i64, work_session_id: i64, check_interval: Duration) {
    let mut interval = tokio::time::interval(check_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        match services.work_sessions.get_active_work_session(employee_id).await {
            Ok(Some(session)) if session.id == work_session_id => {}
            Ok(_) => return,
            Err(e) => msg_warning!(Message::ServiceCallFailed {
                operation: "get_active_work_session".to_string(),
                error: e.to_string(),
            }),
        }
    }
}

/// Subscriber printing state changes to the terminal.
pub fn state_reporter() -> impl Fn(&IdleSessionState) + Send + Sync + 'static {
    let previous = Mutex::new(IdleState::Active);
    let previous_sync_error = Mutex::new(false);

    move |state: &IdleSessionState| {
        let current = state.state();
        let mut last = previous.lock();
        if *last != current {
            match current {
                IdleState::Warning => msg_warning!(Message::IdleWarningNotice(state.settings.warning_time_minutes)),
                IdleState::Idle => msg_info!(Message::IdleNotice),
                IdleState::Active => msg_success!(Message::WelcomeBack),
            }
            *last = current;
        }

        let mut last_sync = previous_sync_error.lock();
        if state.sync_error && !*last_sync {
            msg_error!(Message::SyncErrorNotice);
        }
        *last_sync = state.sync_error;

        msg_debug!(View::state_line(state));
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => msg_info!(Message::WatcherReceivedSigterm),
                    _ = sigint.recv() => msg_info!(Message::WatcherReceivedSigint),
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                msg_error!(Message::SignalHandlerFailed(e.to_string()));
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => msg_info!(Message::WatcherReceivedCtrlC),
            Err(e) => {
                msg_error!(Message::SignalHandlerFailed(e.to_string()));
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Stops a watcher started from another terminal.
pub fn stop() -> Result<()> {
    let pid_path = DataStorage::new().get_path(PID_FILE)?;
    if !pid_path.exists() {
        msg_info!(Message::WatcherNotRunning);
        return Ok(());
    }

    let pid_str = std::fs::read_to_string(&pid_path)?;
    let pid: u32 = pid_str.trim().parse().map_err(|_| msg_error_anyhow!(Message::InvalidPidFileContent))?;

    let stopped = kill_process(pid)?;
    std::fs::remove_file(pid_path)?;

    if stopped {
        msg_success!(Message::WatcherStopped(pid));
    } else {
        msg_info!(Message::WatcherNotRunning);
    }
    Ok(())
}

#[cfg(unix)]
fn kill_process(pid: u32) -> Result<bool> {
    use std::process::Command;

    let output = Command::new("ps").arg("-p").arg(pid.to_string()).output()?;
    if !output.status.success() {
        return Ok(false);
    }

    // SIGTERM lets the watcher close its idle break before exiting.
    Command::new("kill").arg("-TERM").arg(pid.to_string()).output()?;

    for _ in 0..30 {
        std::thread::sleep(Duration::from_millis(100));
        let check = Command::new("ps").arg("-p").arg(pid.to_string()).output()?;
        if !check.status.success() {
            return Ok(true);
        }
    }

    msg_bail_anyhow!(Message::WatcherFailedToStop(pid));
}

#[cfg(windows)]
fn kill_process(pid: u32) -> Result<bool> {
    use std::process::Command;

    let output = Command::new("taskkill").arg("/PID").arg(pid.to_string()).output()?;
    Ok(output.status.success())
}

#[cfg(not(any(unix, windows)))]
fn kill_process(_pid: u32) -> Result<bool> {
    msg_bail_anyhow!(Message::ProcessTerminationNotSupported);
}

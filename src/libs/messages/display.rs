//! Text of every user-facing message.
//!
//! All wording lives in this one `match`, so changing a phrase never means
//! hunting through the code base. Parameters are interpolated here as well;
//! call sites only pick the variant.

use super::types::Message;
use crate::libs::formatter::format_minutes;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            // === ACTIVITY MESSAGES ===
            Message::ActivityMonitoringUnsupported(reason) => {
                format!("Input activity cannot be monitored here, idle detection is off: {}", reason)
            }
            Message::ErrorInRdevListener(error) => format!("Error in input listener: {}", error),
            Message::IdleTimeReset => "Idle timer reset".to_string(),

            // === IDLE COORDINATOR MESSAGES ===
            Message::IdleMonitorStarted {
                employee_id,
                threshold,
                warning,
            } => format!(
                "Idle monitoring started for employee {} (idle after {}, warning {} before)",
                employee_id,
                format_minutes(*threshold),
                format_minutes(*warning)
            ),
            Message::IdleMonitorStopped(total) => format!("Idle monitoring stopped, total idle time {}", total),
            Message::IdleStateChanged(from, to) => format!("Idle state {} -> {}", from, to),
            Message::IdleStarted(time) => format!("Idle since {}", time),
            Message::IdleEnded(duration) => format!("Idle period ended after {}", duration),
            Message::IdleWithoutWorkSession(employee_id) => {
                format!("Employee {} has no open work session, idle time is not recorded as a break", employee_id)
            }
            Message::IdleSettingsDefaulted(employee_id) => {
                format!("No idle settings stored for employee {}, using defaults", employee_id)
            }
            Message::IdleWarningNeverShown { warning, threshold } => format!(
                "Warning time ({}) is not shorter than the idle threshold ({}); the idle warning will never be shown",
                format_minutes(*warning),
                format_minutes(*threshold)
            ),
            Message::IdleSyncDegraded(count) => {
                format!("{} service calls failed in a row, idle breaks are not being recorded", count)
            }
            Message::IdleBreakClosedOnShutdown(id) => format!("Closed idle break {} on shutdown", id),
            Message::BreakAlreadyOpen(id, trigger) => format!("Break {} ({}) is already open, not starting another", id, trigger),
            Message::BreakAlreadyClosed(id) => format!("Break {} was already closed", id),
            Message::ClosingOrphanedBreak(id) => format!("Closing break {} started after shutdown", id),
            Message::ServiceCallFailed { operation, error } => format!("{} failed: {}", operation, error),

            // === WATCH NOTICES ===
            Message::IdleWarningNotice(minutes) => format!(
                "No activity detected. You will be marked idle in {}.",
                format_minutes(*minutes)
            ),
            Message::IdleNotice => "You are idle. A break has been started.".to_string(),
            Message::WelcomeBack => "Welcome back, you are active again.".to_string(),
            Message::SyncErrorNotice => "Cannot reach the break service. Idle time may not be recorded.".to_string(),

            // === WORK SESSION MESSAGES ===
            Message::ClockedIn(id, time) => format!("Clocked in at {} (work session {})", time, id),
            Message::ClockedOut(id) => format!("Clocked out (work session {})", id),
            Message::AlreadyClockedIn => "Already clocked in".to_string(),
            Message::NotClockedIn => "Not clocked in. Run 'idlewatch clock-in' first.".to_string(),
            Message::WorkSessionEnded(id) => format!("Work session {} has ended, stopping", id),
            Message::StatusHeader(employee_id) => format!("Status of employee {}", employee_id),

            // === BREAK MESSAGES ===
            Message::BreakStarted(id) => format!("Break {} started", id),
            Message::BreakEnded(id) => format!("Break {} ended", id),
            Message::BreakAlreadyInProgress(id, trigger) => format!("Break {} ({}) is already in progress", id, trigger),
            Message::NoActiveBreak => "No open break".to_string(),
            Message::BreaksHeader(date) => format!("Breaks for {}", date),
            Message::BreaksNotFound(date) => format!("No breaks found for {}", date),

            // === SETTINGS MESSAGES ===
            Message::SettingsHeader => "Idle settings".to_string(),
            Message::SettingsUpdated => "Idle settings updated".to_string(),
            Message::SettingsRecordMissing(employee_id) => {
                format!("Idle settings of employee {} have no stored record", employee_id)
            }
            Message::InvalidSettingValue(field, value) => format!("Invalid value for {}: {}", field, value),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigModuleEmployee => "Employee settings".to_string(),
            Message::ConfigModuleMonitor => "Monitor settings".to_string(),
            Message::ConfigModuleServer => "Clinic server settings (leave the URL empty to use the local database)".to_string(),
            Message::EmployeeNotConfigured => "No employee configured. Run 'idlewatch init' first.".to_string(),
            Message::UsingClinicServer(url) => format!("Using clinic server at {}", url),
            Message::UsingLocalDatabase => "Using local database".to_string(),

            // === PROMPTS ===
            Message::PromptSelectModules => "Select modules to configure".to_string(),
            Message::PromptEmployeeId => "Employee ID".to_string(),
            Message::PromptTickInterval => "Evaluation interval (seconds, 1-60)".to_string(),
            Message::PromptActivityThrottle => "Input event throttle (milliseconds)".to_string(),
            Message::PromptSyncErrorAfter => "Failed calls before reporting a sync error".to_string(),
            Message::PromptSessionCheck => "Work session check interval (seconds)".to_string(),
            Message::PromptServerApiUrl => "Clinic API URL".to_string(),
            Message::PromptServerAuthToken => "Clinic API token".to_string(),

            // === WATCHER PROCESS MESSAGES ===
            Message::WatcherStarted(pid, session_id) => {
                format!("Watching work session {} (PID {}). Press Ctrl-C to stop.", session_id, pid)
            }
            Message::WatcherStopped(pid) => format!("Watcher stopped (PID {})", pid),
            Message::WatcherNotRunning => "Watcher is not running".to_string(),
            Message::WatcherFailedToStop(pid) => format!("Failed to stop watcher (PID {})", pid),
            Message::WatcherReceivedSigterm => "Received SIGTERM, shutting down".to_string(),
            Message::WatcherReceivedSigint => "Received SIGINT, shutting down".to_string(),
            Message::WatcherReceivedCtrlC => "Received Ctrl-C, shutting down".to_string(),
            Message::SignalHandlerFailed(error) => format!("Failed to listen for shutdown signals: {}", error),
            Message::InvalidPidFileContent => "Invalid PID file content".to_string(),
            Message::ProcessTerminationNotSupported => "Stopping the watcher is not supported on this platform".to_string(),

            // === DATABASE MESSAGES ===
            Message::DatabaseUpToDate(version) => format!("Database is up to date (version {})", version),
            Message::DatabaseMigrated(version) => format!("Database upgraded to version {}", version),
            Message::MigrationsFound(count) => format!("Found {} pending migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationFailed(version, error) => format!("Migration v{} failed: {}", version, error),
        };
        write!(f, "{}", s)
    }
}

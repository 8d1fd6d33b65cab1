#[derive(Debug, Clone)]
pub enum Message {
    // === ACTIVITY MESSAGES ===
    ActivityMonitoringUnsupported(String), // reason
    ErrorInRdevListener(String),           // error
    IdleTimeReset,

    // === IDLE COORDINATOR MESSAGES ===
    IdleMonitorStarted {
        employee_id: i64,
        threshold: f64,
        warning: f64,
    },
    IdleMonitorStopped(String), // total idle time
    IdleStateChanged(String, String), // from, to
    IdleStarted(String),        // time
    IdleEnded(String),          // episode duration
    IdleWithoutWorkSession(i64), // employee id
    IdleSettingsDefaulted(i64), // employee id
    IdleWarningNeverShown {
        warning: f64,
        threshold: f64,
    },
    IdleSyncDegraded(u32), // consecutive failures
    IdleBreakClosedOnShutdown(i64), // break id
    BreakAlreadyOpen(i64, String),  // break id, trigger
    BreakAlreadyClosed(i64),        // break id
    ClosingOrphanedBreak(i64),      // break id
    ServiceCallFailed {
        operation: String,
        error: String,
    },

    // === WATCH NOTICES ===
    IdleWarningNotice(f64), // minutes left
    IdleNotice,
    WelcomeBack,
    SyncErrorNotice,

    // === WORK SESSION MESSAGES ===
    ClockedIn(i64, String), // session id, time
    ClockedOut(i64),        // session id
    AlreadyClockedIn,
    NotClockedIn,
    WorkSessionEnded(i64), // session id
    StatusHeader(i64),     // employee id

    // === BREAK MESSAGES ===
    BreakStarted(i64),                    // break id
    BreakEnded(i64),                      // break id
    BreakAlreadyInProgress(i64, String), // break id, trigger
    NoActiveBreak,
    BreaksHeader(String),   // date
    BreaksNotFound(String), // date

    // === SETTINGS MESSAGES ===
    SettingsHeader,
    SettingsUpdated,
    SettingsRecordMissing(i64),         // employee id
    InvalidSettingValue(String, f64), // field, value

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigModuleEmployee,
    ConfigModuleMonitor,
    ConfigModuleServer,
    EmployeeNotConfigured,
    UsingClinicServer(String), // url
    UsingLocalDatabase,

    // === PROMPTS ===
    PromptSelectModules,
    PromptEmployeeId,
    PromptTickInterval,
    PromptActivityThrottle,
    PromptSyncErrorAfter,
    PromptSessionCheck,
    PromptServerApiUrl,
    PromptServerAuthToken,

    // === WATCHER PROCESS MESSAGES ===
    WatcherStarted(u32, i64), // PID, work session id
    WatcherStopped(u32),      // PID
    WatcherNotRunning,
    WatcherFailedToStop(u32), // PID
    WatcherReceivedSigterm,
    WatcherReceivedSigint,
    WatcherReceivedCtrlC,
    SignalHandlerFailed(String), // error
    InvalidPidFileContent,
    ProcessTerminationNotSupported,

    // === DATABASE MESSAGES ===
    DatabaseUpToDate(u32), // version
    DatabaseMigrated(u32), // version
    MigrationsFound(usize),        // count
    RunningMigration(u32, String), // version, name
    MigrationFailed(u32, String),  // version, error
}

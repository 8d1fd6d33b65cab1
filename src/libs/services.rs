//! Service ports the idle watcher depends on.
//!
//! The coordinator never talks to storage directly. It goes through these
//! traits, which are implemented by the local SQLite backend
//! ([`crate::db`]), the clinic HTTP backend ([`crate::api`]) and by in-memory
//! fakes in tests.

use crate::libs::error::ServiceError;
use crate::libs::settings::{IdleSettings, IdleSettingsPatch};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// What opened a break session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakTrigger {
    Idle,
    Manual,
}

impl BreakTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakTrigger::Idle => "idle",
            BreakTrigger::Manual => "manual",
        }
    }
}

impl fmt::Display for BreakTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BreakTrigger {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(BreakTrigger::Idle),
            "manual" => Ok(BreakTrigger::Manual),
            other => Err(ServiceError::Invalid(format!("unknown break trigger '{}'", other))),
        }
    }
}

/// Payload for opening a break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakRequest {
    pub trigger: BreakTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BreakRequest {
    pub fn idle() -> Self {
        BreakRequest {
            trigger: BreakTrigger::Idle,
            notes: Some("Automatically started after inactivity".to_string()),
        }
    }

    pub fn manual(notes: Option<String>) -> Self {
        BreakRequest {
            trigger: BreakTrigger::Manual,
            notes,
        }
    }
}

/// A pause within a work session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakSession {
    pub id: i64,
    pub work_session_id: i64,
    pub trigger: BreakTrigger,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    /// Closed duration in seconds.
    pub duration_secs: Option<i64>,
    pub notes: Option<String>,
}

impl BreakSession {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::seconds)
    }
}

/// A clocked-in period for an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSession {
    pub id: i64,
    pub employee_id: i64,
    pub clock_in: NaiveDateTime,
    pub clock_out: Option<NaiveDateTime>,
}

impl WorkSession {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }
}

#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Settings for the employee, `None` if never stored.
    async fn get_idle_settings(&self, employee_id: i64) -> Result<Option<IdleSettings>, ServiceError>;

    /// Persists a first settings record and returns it with its id.
    async fn create_idle_settings(&self, employee_id: i64, defaults: &IdleSettings) -> Result<IdleSettings, ServiceError>;

    async fn update_idle_settings(&self, settings_id: i64, patch: &IdleSettingsPatch) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait BreakService: Send + Sync {
    /// Opens a break in the work session and returns the break id.
    async fn start_break(&self, work_session_id: i64, request: &BreakRequest) -> Result<i64, ServiceError>;

    async fn end_break(&self, break_session_id: i64) -> Result<(), ServiceError>;

    async fn get_active_break(&self, work_session_id: i64) -> Result<Option<BreakSession>, ServiceError>;

    async fn list_breaks(&self, work_session_id: i64) -> Result<Vec<BreakSession>, ServiceError>;
}

#[async_trait]
pub trait WorkSessionService: Send + Sync {
    async fn get_active_work_session(&self, employee_id: i64) -> Result<Option<WorkSession>, ServiceError>;

    async fn clock_in(&self, employee_id: i64) -> Result<WorkSession, ServiceError>;

    /// Closes the work session together with any break still open in it.
    async fn clock_out(&self, work_session_id: i64) -> Result<(), ServiceError>;
}

/// The three ports bundled together, as handed to the coordinator.
#[derive(Clone)]
pub struct Services {
    pub settings: Arc<dyn SettingsService>,
    pub breaks: Arc<dyn BreakService>,
    pub work_sessions: Arc<dyn WorkSessionService>,
}

impl Services {
    /// Uses one backend for all three ports.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: SettingsService + BreakService + WorkSessionService + 'static,
    {
        Services {
            settings: backend.clone(),
            breaks: backend.clone(),
            work_sessions: backend,
        }
    }
}

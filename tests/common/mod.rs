//! In-memory backend shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use idlewatch::libs::activity::{ActivityMonitor, ManualSource};
use idlewatch::libs::coordinator::{CoordinatorOptions, SessionCoordinator};
use idlewatch::libs::error::ServiceError;
use idlewatch::libs::services::{
    BreakRequest, BreakService, BreakSession, Services, SettingsService, WorkSession, WorkSessionService,
};
use idlewatch::libs::settings::{IdleSettings, IdleSettingsPatch};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const EMPLOYEE: i64 = 7;

#[derive(Default)]
struct FakeData {
    settings: Vec<IdleSettings>,
    sessions: Vec<WorkSession>,
    breaks: Vec<BreakSession>,
    next_id: i64,
}

impl FakeData {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Backend implementing all three ports with call logging, per-operation
/// failure injection and gates that hold a call in flight.
#[derive(Default)]
pub struct FakeBackend {
    data: Mutex<FakeData>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Backend with an open work session for [`EMPLOYEE`].
    pub fn clocked_in() -> (Arc<Self>, i64) {
        let backend = Self::new();
        let id = backend.open_session(EMPLOYEE);
        (backend, id)
    }

    pub fn services(self: &Arc<Self>) -> Services {
        Services::from_backend(self.clone())
    }

    pub fn open_session(&self, employee_id: i64) -> i64 {
        let mut data = self.data.lock();
        let id = data.next_id();
        data.sessions.push(WorkSession {
            id,
            employee_id,
            clock_in: now(),
            clock_out: None,
        });
        id
    }

    pub fn close_session(&self, id: i64) {
        let mut data = self.data.lock();
        if let Some(session) = data.sessions.iter_mut().find(|s| s.id == id) {
            session.clock_out = Some(now());
        }
    }

    pub fn put_settings(&self, settings: IdleSettings) -> IdleSettings {
        let mut data = self.data.lock();
        let id = data.next_id();
        let stored = IdleSettings { id: Some(id), ..settings };
        data.settings.retain(|s| s.employee_id != stored.employee_id);
        data.settings.push(stored.clone());
        stored
    }

    pub fn stored_settings(&self, employee_id: i64) -> Option<IdleSettings> {
        self.data.lock().settings.iter().find(|s| s.employee_id == employee_id).cloned()
    }

    /// Opens a break directly, bypassing the call log.
    pub fn put_break(&self, work_session_id: i64, request: &BreakRequest) -> i64 {
        let mut data = self.data.lock();
        let id = data.next_id();
        data.breaks.push(BreakSession {
            id,
            work_session_id,
            trigger: request.trigger,
            start: now(),
            end: None,
            duration_secs: None,
            notes: request.notes.clone(),
        });
        id
    }

    pub fn breaks(&self) -> Vec<BreakSession> {
        self.data.lock().breaks.clone()
    }

    pub fn open_breaks(&self) -> Vec<BreakSession> {
        self.breaks().into_iter().filter(|b| b.is_open()).collect()
    }

    /// Makes `operation` fail with a 503 until [`recover`](Self::recover).
    pub fn fail(&self, operation: &str) {
        self.failing.lock().insert(operation.to_string());
    }

    pub fn recover(&self, operation: &str) {
        self.failing.lock().remove(operation);
    }

    /// Holds every following call to `operation` until a permit is added.
    /// The call is logged before it blocks.
    pub fn hold(&self, operation: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().insert(operation.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == operation).count()
    }

    /// Logs the call, waits at its gate if one is held, then applies any
    /// injected failure.
    async fn call(&self, operation: &str) -> Result<(), ServiceError> {
        self.calls.lock().push(operation.to_string());
        let gate = self.gates.lock().get(operation).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.failing.lock().contains(operation) {
            return Err(ServiceError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsService for FakeBackend {
    async fn get_idle_settings(&self, employee_id: i64) -> Result<Option<IdleSettings>, ServiceError> {
        self.call("get_idle_settings").await?;
        Ok(self.stored_settings(employee_id))
    }

    async fn create_idle_settings(&self, employee_id: i64, defaults: &IdleSettings) -> Result<IdleSettings, ServiceError> {
        self.call("create_idle_settings").await?;
        if let Some(existing) = self.stored_settings(employee_id) {
            return Ok(existing);
        }
        Ok(self.put_settings(IdleSettings {
            employee_id,
            ..defaults.clone()
        }))
    }

    async fn update_idle_settings(&self, settings_id: i64, patch: &IdleSettingsPatch) -> Result<(), ServiceError> {
        self.call("update_idle_settings").await?;
        let mut data = self.data.lock();
        let settings = data
            .settings
            .iter_mut()
            .find(|s| s.id == Some(settings_id))
            .ok_or(ServiceError::NotFound {
                entity: "idle settings",
                id: settings_id,
            })?;
        settings.apply(patch);
        Ok(())
    }
}

#[async_trait]
impl BreakService for FakeBackend {
    async fn start_break(&self, work_session_id: i64, request: &BreakRequest) -> Result<i64, ServiceError> {
        self.call("start_break").await?;
        if self.data.lock().breaks.iter().any(|b| b.work_session_id == work_session_id && b.is_open()) {
            return Err(ServiceError::Conflict("break already open".to_string()));
        }
        Ok(self.put_break(work_session_id, request))
    }

    async fn end_break(&self, break_session_id: i64) -> Result<(), ServiceError> {
        self.call("end_break").await?;
        let mut data = self.data.lock();
        let found = data.breaks.iter_mut().find(|b| b.id == break_session_id).ok_or(ServiceError::NotFound {
            entity: "break",
            id: break_session_id,
        })?;
        if found.end.is_none() {
            let end = now();
            found.duration_secs = Some((end - found.start).num_seconds());
            found.end = Some(end);
        }
        Ok(())
    }

    async fn get_active_break(&self, work_session_id: i64) -> Result<Option<BreakSession>, ServiceError> {
        self.call("get_active_break").await?;
        Ok(self
            .data
            .lock()
            .breaks
            .iter()
            .find(|b| b.work_session_id == work_session_id && b.is_open())
            .cloned())
    }

    async fn list_breaks(&self, work_session_id: i64) -> Result<Vec<BreakSession>, ServiceError> {
        self.call("list_breaks").await?;
        Ok(self.breaks().into_iter().filter(|b| b.work_session_id == work_session_id).collect())
    }
}

#[async_trait]
impl WorkSessionService for FakeBackend {
    async fn get_active_work_session(&self, employee_id: i64) -> Result<Option<WorkSession>, ServiceError> {
        self.call("get_active_work_session").await?;
        Ok(self
            .data
            .lock()
            .sessions
            .iter()
            .find(|s| s.employee_id == employee_id && s.is_open())
            .cloned())
    }

    async fn clock_in(&self, employee_id: i64) -> Result<WorkSession, ServiceError> {
        self.call("clock_in").await?;
        let id = self.open_session(employee_id);
        let data = self.data.lock();
        data.sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(ServiceError::NotFound { entity: "work session", id })
    }

    async fn clock_out(&self, work_session_id: i64) -> Result<(), ServiceError> {
        self.call("clock_out").await?;
        self.close_session(work_session_id);
        Ok(())
    }
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

/// Settings with a 10 minute threshold and a 2 minute warning, stored for
/// [`EMPLOYEE`].
pub fn standard_settings(backend: &FakeBackend) -> IdleSettings {
    backend.put_settings(IdleSettings::defaults_for(EMPLOYEE))
}

/// Coordinator over a manual input source whose own loop stays out of the
/// way: its first tick comes an hour after initialize.
pub fn coordinator(backend: &Arc<FakeBackend>) -> (SessionCoordinator, Arc<ManualSource>) {
    let source = Arc::new(ManualSource::new());
    let monitor = ActivityMonitor::with_throttle(source.clone(), Duration::ZERO);
    let options = CoordinatorOptions {
        tick_interval: Duration::from_secs(3600),
        sync_error_after: 3,
    };
    (SessionCoordinator::new(monitor, backend.services(), options), source)
}

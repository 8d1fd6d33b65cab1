//! Session coordinator: turns idle policy decisions into break sessions.
//!
//! One coordinator exists per clocked-in work session. It owns the evaluation
//! loop, the subscriber list and the bookkeeping of idle episodes, and calls
//! the break/work-session services when the employee goes idle or comes back.
//!
//! ## Serialization
//!
//! Every transition with side effects runs while holding the transition lock.
//! A tick that finds the lock taken does not wait: it leaves a recheck request
//! and returns [`TickOutcome::Deferred`]. The holder re-evaluates before
//! releasing the lock, so a resume that happens while a `start_break` call is
//! in flight still produces its `end_break` once the first call settles.
//! Manual overrides wait for the lock instead of being deferred.
//!
//! ## Settled state only
//!
//! Local state changes only after the service call behind it succeeded, and
//! subscribers are notified after the lock-holder finished. After
//! [`SessionCoordinator::destroy`] any late result is discarded; a break that
//! was opened by such a late call is closed again right away.

use crate::libs::activity::ActivityMonitor;
use crate::libs::error::{CoordinatorError, ServiceError};
use crate::libs::formatter::format_std_duration;
use crate::libs::messages::Message;
use crate::libs::policy::{self, IdleState};
use crate::libs::services::{BreakRequest, BreakTrigger, Services};
use crate::libs::settings::{IdleSettings, IdleSettingsPatch};
use crate::{msg_debug, msg_error, msg_info, msg_warning};
use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as TransitionLock, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_SYNC_ERROR_AFTER: u32 = 3;

/// Loop tuning for a coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Period of the evaluation tick.
    pub tick_interval: Duration,
    /// Consecutive failed service calls before `sync_error` is raised.
    pub sync_error_after: u32,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        CoordinatorOptions {
            tick_interval: DEFAULT_TICK_INTERVAL,
            sync_error_after: DEFAULT_SYNC_ERROR_AFTER,
        }
    }
}

/// Snapshot handed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct IdleSessionState {
    pub is_idle: bool,
    pub is_warning: bool,
    /// Sum of closed idle episodes in this work session.
    pub total_idle_time: Duration,
    /// Wall-clock start of the running idle episode.
    pub current_idle_start: Option<NaiveDateTime>,
    pub settings: IdleSettings,
    /// Break opened by the running idle episode, if it opened one.
    pub idle_break_id: Option<i64>,
    /// Set after repeated service failures; cleared by the next success.
    pub sync_error: bool,
    /// The warning window cannot fire with the current settings.
    pub misconfigured: bool,
}

impl IdleSessionState {
    pub fn state(&self) -> IdleState {
        if self.is_idle {
            IdleState::Idle
        } else if self.is_warning {
            IdleState::Warning
        } else {
            IdleState::Active
        }
    }

    pub fn total_idle_minutes(&self) -> f64 {
        self.total_idle_time.as_secs_f64() / 60.0
    }
}

pub type StateCallback = Arc<dyn Fn(&IdleSessionState) + Send + Sync>;

/// Token returned by [`SessionCoordinator::add_state_callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The policy was evaluated and any transition applied.
    Evaluated,
    /// Another transition was in flight; it will re-evaluate when done.
    Deferred,
    /// Not initialized, or already destroyed.
    NotRunning,
}

struct IdleEpisode {
    started_at: Instant,
    started_wall: NaiveDateTime,
    break_id: Option<i64>,
    origin: BreakTrigger,
    /// `end_break` for this episode is in flight.
    closing: bool,
}

struct CoordinatorState {
    employee_id: Option<i64>,
    initialized: bool,
    settings: IdleSettings,
    settings_loaded: bool,
    settings_dirty: bool,
    phase: IdleState,
    episode: Option<IdleEpisode>,
    total_idle: Duration,
    consecutive_failures: u32,
    sync_error: bool,
    recheck: bool,
    last_published: Option<IdleSessionState>,
}

struct Inner {
    monitor: ActivityMonitor,
    services: Services,
    options: CoordinatorOptions,
    state: Mutex<CoordinatorState>,
    transition: TransitionLock<()>,
    subscribers: Mutex<Vec<(SubscriptionId, StateCallback)>>,
    next_subscription: AtomicU64,
    destroyed: AtomicBool,
    cancel: CancellationToken,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

/// Cheaply cloneable handle to one coordinator.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<Inner>,
}

impl SessionCoordinator {
    pub fn new(monitor: ActivityMonitor, services: Services, options: CoordinatorOptions) -> Self {
        SessionCoordinator {
            inner: Arc::new(Inner {
                monitor,
                services,
                options,
                state: Mutex::new(CoordinatorState {
                    employee_id: None,
                    initialized: false,
                    settings: IdleSettings::defaults_for(0),
                    settings_loaded: false,
                    settings_dirty: false,
                    phase: IdleState::Active,
                    episode: None,
                    total_idle: Duration::ZERO,
                    consecutive_failures: 0,
                    sync_error: false,
                    recheck: false,
                    last_published: None,
                }),
                transition: TransitionLock::new(()),
                subscribers: Mutex::new(Vec::new()),
                next_subscription: AtomicU64::new(1),
                destroyed: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                loop_handle: Mutex::new(None),
            }),
        }
    }

    /// Loads the employee's settings, starts the activity monitor and the
    /// evaluation loop. Repeated calls are no-ops.
    ///
    /// Missing settings are created from the defaults; unreachable settings
    /// fall back to the defaults and are fetched again on later ticks.
    pub async fn initialize(&self, employee_id: i64) -> Result<(), CoordinatorError> {
        if self.is_destroyed() {
            return Err(CoordinatorError::Destroyed);
        }
        let guard = self.inner.transition.lock().await;
        if self.is_initialized() {
            return Ok(());
        }

        let loaded = self.load_settings(employee_id).await;
        if self.is_destroyed() {
            return Err(CoordinatorError::Destroyed);
        }

        let settings = {
            let mut st = self.inner.state.lock();
            st.employee_id = Some(employee_id);
            st.settings_loaded = loaded.is_some();
            st.settings = loaded.unwrap_or_else(|| IdleSettings::defaults_for(employee_id));
            st.phase = IdleState::Active;
            st.initialized = true;
            st.settings.clone()
        };
        if settings.is_misconfigured() {
            msg_warning!(Message::IdleWarningNeverShown {
                warning: settings.warning_time_minutes,
                threshold: settings.idle_threshold_minutes,
            });
        }

        self.inner.monitor.start();
        *self.inner.loop_handle.lock() = Some(self.spawn_loop());
        msg_info!(Message::IdleMonitorStarted {
            employee_id,
            threshold: settings.idle_threshold_minutes,
            warning: settings.warning_time_minutes,
        });

        drop(guard);
        self.publish();
        Ok(())
    }

    fn spawn_loop(&self) -> JoinHandle<()> {
        let coordinator = self.clone();
        let cancel = self.inner.cancel.clone();
        let period = self.inner.options.tick_interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            // First evaluation one period after start; settings were just loaded.
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        coordinator.tick().await;
                    }
                    _ = coordinator.inner.monitor.activity() => {
                        // Resuming must not wait for the next tick.
                        if coordinator.phase() != IdleState::Active {
                            coordinator.tick().await;
                        }
                    }
                }
            }
        })
    }

    /// One evaluation of the idle policy.
    pub async fn tick(&self) -> TickOutcome {
        if self.is_destroyed() {
            return TickOutcome::NotRunning;
        }
        let guard = {
            let mut st = self.inner.state.lock();
            if !st.initialized {
                return TickOutcome::NotRunning;
            }
            match self.inner.transition.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    st.recheck = true;
                    return TickOutcome::Deferred;
                }
            }
        };

        self.evaluate_and_apply().await;
        self.drain(guard).await;
        self.publish();
        TickOutcome::Evaluated
    }

    /// Re-runs evaluation for ticks deferred while the lock was held, then
    /// releases it. The recheck flag is read and the lock dropped under the
    /// state mutex so a deferral cannot slip in between.
    async fn drain(&self, guard: MutexGuard<'_, ()>) {
        loop {
            {
                let mut st = self.inner.state.lock();
                if !st.recheck || self.is_destroyed() {
                    st.recheck = false;
                    drop(guard);
                    return;
                }
                st.recheck = false;
            }
            self.evaluate_and_apply().await;
        }
    }

    async fn evaluate_and_apply(&self) {
        if self.is_destroyed() {
            return;
        }
        self.sync_settings().await;

        let (settings, phase, manual_episode) = {
            let st = self.inner.state.lock();
            let manual = st.episode.as_ref().map(|e| e.origin == BreakTrigger::Manual).unwrap_or(false);
            (st.settings.clone(), st.phase, manual)
        };
        let elapsed = self.inner.monitor.idle_duration();
        let next = policy::evaluate(elapsed, &settings, phase);

        match (phase, next) {
            (IdleState::Idle, IdleState::Idle) => {}
            // Manually started episodes only end through manual_end_idle.
            (IdleState::Idle, _) if manual_episode => {}
            (IdleState::Idle, next) => {
                self.leave_idle(next).await;
            }
            (_, IdleState::Idle) => {
                let since = self.inner.monitor.last_activity();
                self.enter_idle(BreakRequest::idle(), since).await;
            }
            (current, next) if current != next => {
                msg_debug!(Message::IdleStateChanged(current.to_string(), next.to_string()));
                self.inner.state.lock().phase = next;
            }
            _ => {}
        }
    }

    /// Starts an idle episode. A break is opened only when a work session is
    /// active and no break is open in it yet.
    async fn enter_idle(&self, request: BreakRequest, since: Instant) -> bool {
        let employee_id = match self.employee_id() {
            Some(id) => id,
            None => return false,
        };
        let services = &self.inner.services;

        let session = match services.work_sessions.get_active_work_session(employee_id).await {
            Ok(session) => session,
            Err(e) => {
                self.record_failure("get_active_work_session", &e);
                return false;
            }
        };

        let mut break_id = None;
        match session {
            Some(session) => match services.breaks.get_active_break(session.id).await {
                Ok(Some(open)) => {
                    msg_debug!(Message::BreakAlreadyOpen(open.id, open.trigger.to_string()));
                }
                Ok(None) => match services.breaks.start_break(session.id, &request).await {
                    Ok(id) => break_id = Some(id),
                    Err(e) => {
                        self.record_failure("start_break", &e);
                        return false;
                    }
                },
                Err(e) => {
                    self.record_failure("get_active_break", &e);
                    return false;
                }
            },
            None => {
                msg_debug!(Message::IdleWithoutWorkSession(employee_id));
            }
        }

        if self.is_destroyed() {
            if let Some(id) = break_id {
                self.close_orphaned_break(id).await;
            }
            return false;
        }

        self.record_success();
        let started_wall = wall_clock_since(since);
        {
            let mut st = self.inner.state.lock();
            st.phase = IdleState::Idle;
            st.episode = Some(IdleEpisode {
                started_at: since,
                started_wall,
                break_id,
                origin: request.trigger,
                closing: false,
            });
        }
        msg_info!(Message::IdleStarted(started_wall.format("%H:%M").to_string()));
        true
    }

    /// Ends the running idle episode and closes the break it opened.
    ///
    /// The episode is marked as closing while `end_break` is in flight so that
    /// a concurrent [`destroy`](Self::destroy) leaves the call to this path.
    async fn leave_idle(&self, next: IdleState) -> bool {
        let break_id = {
            let mut st = self.inner.state.lock();
            st.episode.as_mut().and_then(|e| {
                e.closing = true;
                e.break_id
            })
        };

        if let Some(id) = break_id {
            match self.inner.services.breaks.end_break(id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    msg_debug!(Message::BreakAlreadyClosed(id));
                }
                Err(e) => {
                    self.record_failure("end_break", &e);
                    let destroyed = {
                        let mut st = self.inner.state.lock();
                        let destroyed = self.is_destroyed();
                        if !destroyed {
                            if let Some(episode) = st.episode.as_mut() {
                                episode.closing = false;
                            }
                        }
                        destroyed
                    };
                    // destroy() skipped this break; one more attempt.
                    if destroyed {
                        self.close_orphaned_break(id).await;
                    }
                    return false;
                }
            }
        }

        if self.is_destroyed() {
            return false;
        }

        self.record_success();
        let closed = {
            let mut st = self.inner.state.lock();
            st.phase = next;
            let closed = st.episode.take().map(|e| Instant::now().saturating_duration_since(e.started_at));
            if let Some(d) = closed {
                st.total_idle += d;
            }
            closed
        };
        if let Some(d) = closed {
            msg_info!(Message::IdleEnded(format_std_duration(d)));
        }
        true
    }

    async fn close_orphaned_break(&self, id: i64) {
        msg_warning!(Message::ClosingOrphanedBreak(id));
        if let Err(e) = self.inner.services.breaks.end_break(id).await {
            if !e.is_not_found() {
                msg_error!(Message::ServiceCallFailed {
                    operation: "end_break".to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Starts an idle episode now, opening a `manual` break. Such an episode
    /// is not ended by activity, only by [`manual_end_idle`](Self::manual_end_idle).
    ///
    /// Returns `Ok(false)` when already idle or when the service call failed.
    pub async fn manual_start_idle(&self, reason: Option<String>) -> Result<bool, CoordinatorError> {
        self.ensure_ready()?;
        let guard = self.inner.transition.lock().await;

        let applied = if self.phase() == IdleState::Idle {
            false
        } else {
            self.enter_idle(BreakRequest::manual(reason), Instant::now()).await
        };

        self.drain(guard).await;
        self.publish();
        Ok(applied)
    }

    /// Ends the running idle episode, whatever started it, and resets the idle
    /// clock so the next tick does not re-enter Idle.
    pub async fn manual_end_idle(&self) -> Result<bool, CoordinatorError> {
        self.ensure_ready()?;
        let guard = self.inner.transition.lock().await;

        let applied = if self.phase() != IdleState::Idle {
            false
        } else {
            let left = self.leave_idle(IdleState::Active).await;
            if left {
                self.inner.monitor.reset_idle_time();
            }
            left
        };

        self.drain(guard).await;
        self.publish();
        Ok(applied)
    }

    /// "I'm still here": resets the idle clock and evaluates immediately.
    ///
    /// An idle episode started by the policy ends here even when
    /// `auto_end_idle_on_activity` is off. Manual episodes are left alone.
    pub async fn reset_idle_time(&self) -> Result<TickOutcome, CoordinatorError> {
        self.ensure_ready()?;
        self.inner.monitor.reset_idle_time();
        let guard = self.inner.transition.lock().await;
        if self.is_destroyed() {
            return Ok(TickOutcome::NotRunning);
        }

        let policy_episode = {
            let st = self.inner.state.lock();
            st.phase == IdleState::Idle && st.episode.as_ref().map_or(false, |e| e.origin == BreakTrigger::Idle)
        };
        if policy_episode {
            self.leave_idle(IdleState::Active).await;
        } else {
            self.evaluate_and_apply().await;
        }

        self.drain(guard).await;
        self.publish();
        Ok(TickOutcome::Evaluated)
    }

    /// Applies a settings change locally (effective from the next tick) and
    /// persists it. A failed write is retried on later ticks.
    pub async fn update_settings(&self, patch: IdleSettingsPatch) -> Result<(), CoordinatorError> {
        self.ensure_ready()?;
        if patch.is_empty() {
            return Ok(());
        }
        let guard = self.inner.transition.lock().await;

        let settings = {
            let mut st = self.inner.state.lock();
            st.settings.apply(&patch);
            st.settings = st.settings.clone().sanitized();
            st.settings_dirty = true;
            st.settings.clone()
        };
        if settings.is_misconfigured() {
            msg_warning!(Message::IdleWarningNeverShown {
                warning: settings.warning_time_minutes,
                threshold: settings.idle_threshold_minutes,
            });
        }
        self.flush_settings().await;

        self.drain(guard).await;
        self.publish();
        Ok(())
    }

    async fn sync_settings(&self) {
        let (loaded, dirty, employee_id) = {
            let st = self.inner.state.lock();
            (st.settings_loaded, st.settings_dirty, st.employee_id)
        };
        if dirty {
            self.flush_settings().await;
        } else if !loaded {
            if let Some(employee_id) = employee_id {
                if let Some(settings) = self.load_settings(employee_id).await {
                    let mut st = self.inner.state.lock();
                    st.settings = settings;
                    st.settings_loaded = true;
                }
            }
        }
    }

    async fn load_settings(&self, employee_id: i64) -> Option<IdleSettings> {
        let service = &self.inner.services.settings;
        match service.get_idle_settings(employee_id).await {
            Ok(Some(settings)) => {
                self.record_success();
                Some(settings.sanitized())
            }
            Ok(None) => {
                msg_info!(Message::IdleSettingsDefaulted(employee_id));
                let defaults = IdleSettings::defaults_for(employee_id);
                match service.create_idle_settings(employee_id, &defaults).await {
                    Ok(created) => {
                        self.record_success();
                        Some(created.sanitized())
                    }
                    Err(e) => {
                        self.record_failure("create_idle_settings", &e);
                        None
                    }
                }
            }
            Err(e) => {
                self.record_failure("get_idle_settings", &e);
                None
            }
        }
    }

    async fn flush_settings(&self) {
        let (settings, employee_id) = {
            let st = self.inner.state.lock();
            (st.settings.clone(), st.employee_id)
        };
        let employee_id = match employee_id {
            Some(id) => id,
            None => return,
        };
        let service = &self.inner.services.settings;

        let result = match settings.id {
            Some(id) => service.update_idle_settings(id, &settings.to_patch()).await.map(|_| id),
            None => service.create_idle_settings(employee_id, &settings).await.and_then(|created| {
                created.id.ok_or_else(|| ServiceError::Invalid("settings record without id".to_string()))
            }),
        };

        match result {
            Ok(id) => {
                self.record_success();
                let mut st = self.inner.state.lock();
                st.settings.id = Some(id);
                st.settings_dirty = false;
                st.settings_loaded = true;
            }
            Err(e) => self.record_failure("update_idle_settings", &e),
        }
    }

    /// Stops the loop and the monitor, closes an open idle-triggered break and
    /// drops all subscribers. Safe to call more than once.
    ///
    /// A service call already in flight is not cancelled; its result is
    /// ignored when it arrives.
    pub async fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.cancel.cancel();
        self.inner.loop_handle.lock().take();
        self.inner.monitor.stop();

        let episode = {
            let mut st = self.inner.state.lock();
            let episode = st.episode.take();
            if let Some(e) = &episode {
                st.total_idle += Instant::now().saturating_duration_since(e.started_at);
            }
            st.phase = IdleState::Active;
            episode
        };

        // A closing episode is finished by the leave_idle call that owns it.
        if let Some(IdleEpisode {
            break_id: Some(id),
            origin: BreakTrigger::Idle,
            closing: false,
            ..
        }) = episode
        {
            match self.inner.services.breaks.end_break(id).await {
                Ok(()) => msg_info!(Message::IdleBreakClosedOnShutdown(id)),
                Err(e) if e.is_not_found() => {}
                Err(e) => msg_warning!(Message::ServiceCallFailed {
                    operation: "end_break".to_string(),
                    error: e.to_string(),
                }),
            }
        }

        self.inner.subscribers.lock().clear();
        let total = self.inner.state.lock().total_idle;
        msg_info!(Message::IdleMonitorStopped(format_std_duration(total)));
    }

    /// Registers a callback invoked with every changed snapshot.
    pub fn add_state_callback<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&IdleSessionState) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.inner.subscribers.lock().push((id, Arc::new(callback)));
        id
    }

    pub fn remove_state_callback(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Current snapshot.
    pub fn state(&self) -> IdleSessionState {
        let st = self.inner.state.lock();
        IdleSessionState {
            is_idle: st.phase == IdleState::Idle,
            is_warning: st.phase == IdleState::Warning,
            total_idle_time: st.total_idle,
            current_idle_start: st.episode.as_ref().map(|e| e.started_wall),
            settings: st.settings.clone(),
            idle_break_id: st.episode.as_ref().and_then(|e| e.break_id),
            sync_error: st.sync_error,
            misconfigured: st.settings.is_misconfigured(),
        }
    }

    pub fn phase(&self) -> IdleState {
        self.inner.state.lock().phase
    }

    pub fn employee_id(&self) -> Option<i64> {
        self.inner.state.lock().employee_id
    }

    pub fn monitor(&self) -> &ActivityMonitor {
        &self.inner.monitor
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.state.lock().initialized
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    fn ensure_ready(&self) -> Result<(), CoordinatorError> {
        if self.is_destroyed() {
            return Err(CoordinatorError::Destroyed);
        }
        if !self.is_initialized() {
            return Err(CoordinatorError::NotInitialized);
        }
        Ok(())
    }

    /// Notifies subscribers if the snapshot differs from the last one sent.
    fn publish(&self) {
        if self.is_destroyed() {
            return;
        }
        let snapshot = self.state();
        {
            let mut st = self.inner.state.lock();
            if st.last_published.as_ref() == Some(&snapshot) {
                return;
            }
            st.last_published = Some(snapshot.clone());
        }
        let callbacks: Vec<StateCallback> = self.inner.subscribers.lock().iter().map(|(_, cb)| cb.clone()).collect();
        for callback in callbacks {
            callback(&snapshot);
        }
    }

    fn record_failure(&self, operation: &str, error: &ServiceError) {
        let limit = self.inner.options.sync_error_after.max(1);
        let degraded = {
            let mut st = self.inner.state.lock();
            st.consecutive_failures += 1;
            if !st.sync_error && st.consecutive_failures >= limit {
                st.sync_error = true;
                Some(st.consecutive_failures)
            } else {
                None
            }
        };
        msg_warning!(Message::ServiceCallFailed {
            operation: operation.to_string(),
            error: error.to_string(),
        });
        if let Some(count) = degraded {
            msg_error!(Message::IdleSyncDegraded(count));
        }
    }

    fn record_success(&self) {
        let mut st = self.inner.state.lock();
        st.consecutive_failures = 0;
        st.sync_error = false;
    }
}

fn wall_clock_since(since: Instant) -> NaiveDateTime {
    let ago = Instant::now().saturating_duration_since(since);
    let ago = chrono::Duration::from_std(ago).unwrap_or_else(|_| chrono::Duration::zero());
    Local::now().naive_local() - ago
}

//! Activity monitor: tracks when the employee last touched an input device.
//!
//! Input arrives through an [`ActivitySource`]. The real source hooks OS input
//! events ([`crate::libs::input::InputDeviceSource`]); [`ManualSource`] is a
//! synthetic one that tests and embedding applications drive by hand.
//!
//! Bursts of events are coalesced: the source writes the timestamp at most
//! once per throttle interval. Explicit calls ([`ActivityMonitor::record_activity`],
//! [`ActivityMonitor::reset_idle_time`]) always write.
//!
//! If the source cannot attach, the monitor goes inert: `start()` returns
//! normally and the idle duration stays at zero, so idle detection simply
//! never triggers.

use crate::libs::error::ActivityError;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_warning};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tokio::time::{Duration, Instant};

/// Default coalescing window for raw input events.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(1000);

/// Kind of input that counted as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    PointerMove,
    KeyDown,
    Scroll,
    TouchStart,
    Click,
    /// Recorded programmatically.
    Manual,
    /// "I'm still here" confirmation.
    Reset,
}

struct ActivityState {
    last_activity: Instant,
    last_kind: ActivityKind,
}

struct Shared {
    state: Mutex<ActivityState>,
    throttle: Duration,
    monitoring: AtomicBool,
    supported: AtomicBool,
    notify: Notify,
}

impl Shared {
    fn touch(&self, kind: ActivityKind, throttled: bool) -> bool {
        let now = Instant::now();
        {
            let mut state = self.state.lock();
            if throttled && now.saturating_duration_since(state.last_activity) < self.throttle {
                return false;
            }
            if now > state.last_activity {
                state.last_activity = now;
            }
            state.last_kind = kind;
        }
        self.notify.notify_one();
        true
    }
}

/// Handle given to an [`ActivitySource`] to report input.
#[derive(Clone)]
pub struct ActivitySink {
    shared: Arc<Shared>,
}

impl ActivitySink {
    /// Reports one input event. Returns `false` if it was ignored (monitor
    /// stopped or inside the throttle window).
    pub fn record(&self, kind: ActivityKind) -> bool {
        if !self.shared.monitoring.load(Ordering::SeqCst) {
            return false;
        }
        self.shared.touch(kind, true)
    }

    /// Called by a source that lost access to input events after attaching.
    pub fn mark_unsupported(&self, reason: &str) {
        if self.shared.supported.swap(false, Ordering::SeqCst) {
            msg_warning!(Message::ActivityMonitoringUnsupported(reason.to_string()));
        }
    }
}

/// Capability that delivers input events to a sink.
pub trait ActivitySource: Send + Sync {
    /// Starts delivering events. Must not deliver to a previous sink afterwards.
    fn attach(&self, sink: ActivitySink) -> Result<(), ActivityError>;

    /// Stops delivering events.
    fn detach(&self);
}

/// Source with no OS hooks; events are pushed with [`ManualSource::emit`].
pub struct ManualSource {
    sink: Mutex<Option<ActivitySink>>,
    supported: bool,
}

impl ManualSource {
    pub fn new() -> Self {
        ManualSource {
            sink: Mutex::new(None),
            supported: true,
        }
    }

    /// A source that refuses to attach, as in a headless environment.
    pub fn unsupported() -> Self {
        ManualSource {
            sink: Mutex::new(None),
            supported: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.sink.lock().is_some()
    }

    /// Feeds one event through the attached sink, if any.
    pub fn emit(&self, kind: ActivityKind) -> bool {
        let sink = self.sink.lock().clone();
        sink.map(|s| s.record(kind)).unwrap_or(false)
    }
}

impl Default for ManualSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivitySource for ManualSource {
    fn attach(&self, sink: ActivitySink) -> Result<(), ActivityError> {
        if !self.supported {
            return Err(ActivityError::Unsupported("no input source available".to_string()));
        }
        *self.sink.lock() = Some(sink);
        Ok(())
    }

    fn detach(&self) {
        self.sink.lock().take();
    }
}

/// Tracks the last activity timestamp for one work session.
pub struct ActivityMonitor {
    shared: Arc<Shared>,
    source: Arc<dyn ActivitySource>,
}

impl ActivityMonitor {
    pub fn new(source: Arc<dyn ActivitySource>) -> Self {
        Self::with_throttle(source, DEFAULT_THROTTLE)
    }

    pub fn with_throttle(source: Arc<dyn ActivitySource>, throttle: Duration) -> Self {
        ActivityMonitor {
            shared: Arc::new(Shared {
                state: Mutex::new(ActivityState {
                    last_activity: Instant::now(),
                    last_kind: ActivityKind::Manual,
                }),
                throttle,
                monitoring: AtomicBool::new(false),
                supported: AtomicBool::new(true),
                notify: Notify::new(),
            }),
            source,
        }
    }

    /// Attaches the source and resets the idle clock. Calling it again while
    /// running does nothing.
    pub fn start(&self) {
        if self.shared.monitoring.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut state = self.shared.state.lock();
            state.last_activity = Instant::now();
            state.last_kind = ActivityKind::Manual;
        }
        self.shared.supported.store(true, Ordering::SeqCst);

        let sink = ActivitySink {
            shared: self.shared.clone(),
        };
        if let Err(e) = self.source.attach(sink) {
            self.shared.supported.store(false, Ordering::SeqCst);
            msg_warning!(Message::ActivityMonitoringUnsupported(e.to_string()));
        }
    }

    /// Detaches the source. Safe to call repeatedly.
    pub fn stop(&self) {
        if !self.shared.monitoring.swap(false, Ordering::SeqCst) {
            return;
        }
        self.source.detach();
    }

    pub fn is_monitoring(&self) -> bool {
        self.shared.monitoring.load(Ordering::SeqCst)
    }

    /// `false` once the source failed to attach.
    pub fn is_supported(&self) -> bool {
        self.shared.supported.load(Ordering::SeqCst)
    }

    /// Marks "the employee did something" right now.
    pub fn record_activity(&self) {
        self.shared.touch(ActivityKind::Manual, false);
    }

    /// Explicit presence confirmation. Same effect on idle time as
    /// [`record_activity`](Self::record_activity), logged separately.
    pub fn reset_idle_time(&self) {
        msg_debug!(Message::IdleTimeReset);
        self.shared.touch(ActivityKind::Reset, false);
    }

    /// Time since the last activity; zero while stopped or inert.
    pub fn idle_duration(&self) -> Duration {
        if !self.is_monitoring() || !self.is_supported() {
            return Duration::ZERO;
        }
        Instant::now().saturating_duration_since(self.shared.state.lock().last_activity)
    }

    pub fn get_idle_duration_ms(&self) -> u64 {
        self.idle_duration().as_millis() as u64
    }

    pub fn last_activity(&self) -> Instant {
        self.shared.state.lock().last_activity
    }

    pub fn last_kind(&self) -> ActivityKind {
        self.shared.state.lock().last_kind
    }

    /// Completes after the next recorded activity. A notification raised
    /// while nobody was waiting is kept for the next caller.
    pub fn activity(&self) -> Notified<'_> {
        self.shared.notify.notified()
    }
}

impl Drop for ActivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

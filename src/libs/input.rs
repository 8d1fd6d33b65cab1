//! OS input hooks for the activity monitor, built on `rdev`.
//!
//! `rdev::listen` blocks its thread for the life of the process and cannot be
//! unregistered, so the listener thread is spawned once and detaching only
//! drops the sink it forwards to.

use crate::libs::activity::{ActivityKind, ActivitySink, ActivitySource};
use crate::libs::error::ActivityError;
use crate::libs::messages::Message;
use crate::msg_error;
use parking_lot::Mutex;
use rdev::{listen, Event, EventType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Keyboard, mouse and wheel events from the desktop session.
pub struct InputDeviceSource {
    sink: Arc<Mutex<Option<ActivitySink>>>,
    listening: AtomicBool,
}

impl InputDeviceSource {
    pub fn new() -> Self {
        InputDeviceSource {
            sink: Arc::new(Mutex::new(None)),
            listening: AtomicBool::new(false),
        }
    }

    fn classify(event_type: &EventType) -> Option<ActivityKind> {
        match event_type {
            EventType::KeyPress(_) => Some(ActivityKind::KeyDown),
            EventType::ButtonPress(_) => Some(ActivityKind::Click),
            EventType::MouseMove { .. } => Some(ActivityKind::PointerMove),
            EventType::Wheel { .. } => Some(ActivityKind::Scroll),
            _ => None,
        }
    }

    #[cfg(target_os = "linux")]
    fn check_environment() -> Result<(), ActivityError> {
        if std::env::var_os("DISPLAY").is_none() && std::env::var_os("WAYLAND_DISPLAY").is_none() {
            return Err(ActivityError::Unsupported("no graphical session (DISPLAY is not set)".to_string()));
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn check_environment() -> Result<(), ActivityError> {
        Ok(())
    }
}

impl Default for InputDeviceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivitySource for InputDeviceSource {
    fn attach(&self, sink: ActivitySink) -> Result<(), ActivityError> {
        Self::check_environment()?;
        *self.sink.lock() = Some(sink);

        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let shared_sink = self.sink.clone();
        std::thread::Builder::new()
            .name("idlewatch-input".to_string())
            .spawn(move || {
                let listener_sink = shared_sink.clone();
                let result = listen(move |event: Event| {
                    if let Some(kind) = Self::classify(&event.event_type) {
                        if let Some(sink) = listener_sink.lock().as_ref() {
                            sink.record(kind);
                        }
                    }
                });
                if let Err(e) = result {
                    let reason = format!("{:?}", e);
                    msg_error!(Message::ErrorInRdevListener(reason.clone()));
                    if let Some(sink) = shared_sink.lock().take() {
                        sink.mark_unsupported(&reason);
                    }
                }
            })
            .map_err(|e| {
                self.listening.store(false, Ordering::SeqCst);
                ActivityError::Unsupported(e.to_string())
            })?;

        Ok(())
    }

    fn detach(&self) {
        self.sink.lock().take();
    }
}

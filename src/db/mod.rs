//! Local SQLite backend.
//!
//! Used when no clinic server is configured. Each store wraps the shared
//! connection from [`db::Db`] and implements one of the service ports:
//!
//! | Store | Port | Table |
//! |-------|------|-------|
//! | [`idle_settings::IdleSettingsStore`] | `SettingsService` | `idle_settings` |
//! | [`break_sessions::BreakSessions`] | `BreakService` | `break_sessions` |
//! | [`work_sessions::WorkSessions`] | `WorkSessionService` | `work_sessions` |
//!
//! The schema is created and upgraded by [`migrations`] when the database is
//! opened. Timestamps are local time with second precision.

use chrono::{Local, NaiveDateTime, Timelike};

/// Connection handling and schema initialization.
pub mod db;

/// Versioned schema changes.
pub mod migrations;

pub mod break_sessions;

pub mod idle_settings;

pub mod work_sessions;

/// Current local time truncated to whole seconds.
pub(crate) fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

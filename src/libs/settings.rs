//! Per-employee idle detection settings.
//!
//! Settings are owned by the settings service and loaded when a coordinator
//! initializes. Values coming back from storage are passed through
//! [`IdleSettings::sanitized`] so a broken record never disables monitoring.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_IDLE_THRESHOLD_MINUTES: f64 = 10.0;
pub const DEFAULT_WARNING_TIME_MINUTES: f64 = 2.0;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Idle policy configuration for one employee.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdleSettings {
    /// Storage identifier, `None` until the record has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub employee_id: i64,
    /// Minutes without input before the employee is considered idle.
    pub idle_threshold_minutes: f64,
    /// How many minutes before the threshold the warning window opens.
    pub warning_time_minutes: f64,
    pub show_idle_warning: bool,
    pub enabled: bool,
    /// Whether resumed input ends an idle episode on its own.
    #[serde(default = "default_true")]
    pub auto_end_idle_on_activity: bool,
}

fn default_true() -> bool {
    true
}

/// Partial update for [`IdleSettings`]; `None` fields are left untouched.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdleSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_threshold_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_time_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_idle_warning: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_end_idle_on_activity: Option<bool>,
}

impl IdleSettings {
    /// Documented defaults: 10 minute threshold, 2 minute warning, everything on.
    pub fn defaults_for(employee_id: i64) -> Self {
        IdleSettings {
            id: None,
            employee_id,
            idle_threshold_minutes: DEFAULT_IDLE_THRESHOLD_MINUTES,
            warning_time_minutes: DEFAULT_WARNING_TIME_MINUTES,
            show_idle_warning: true,
            enabled: true,
            auto_end_idle_on_activity: true,
        }
    }

    /// Replaces unusable numeric values with the defaults, field by field.
    pub fn sanitized(mut self) -> Self {
        if !self.idle_threshold_minutes.is_finite() || self.idle_threshold_minutes <= 0.0 {
            self.idle_threshold_minutes = DEFAULT_IDLE_THRESHOLD_MINUTES;
        }
        if !self.warning_time_minutes.is_finite() || self.warning_time_minutes < 0.0 {
            self.warning_time_minutes = DEFAULT_WARNING_TIME_MINUTES;
        }
        self
    }

    /// True when the warning window would open at or before zero idle time,
    /// meaning no warning can ever be shown.
    pub fn is_misconfigured(&self) -> bool {
        self.warning_time_minutes >= self.idle_threshold_minutes
    }

    pub fn idle_threshold(&self) -> Duration {
        minutes_to_duration(self.idle_threshold_minutes)
    }

    /// Idle time at which the warning window opens, or `None` when warnings are
    /// switched off or cannot fire before the threshold.
    pub fn warning_start(&self) -> Option<Duration> {
        if !self.show_idle_warning || self.warning_time_minutes <= 0.0 || self.is_misconfigured() {
            return None;
        }
        Some(minutes_to_duration(self.idle_threshold_minutes - self.warning_time_minutes))
    }

    pub fn apply(&mut self, patch: &IdleSettingsPatch) {
        if let Some(v) = patch.idle_threshold_minutes {
            self.idle_threshold_minutes = v;
        }
        if let Some(v) = patch.warning_time_minutes {
            self.warning_time_minutes = v;
        }
        if let Some(v) = patch.show_idle_warning {
            self.show_idle_warning = v;
        }
        if let Some(v) = patch.enabled {
            self.enabled = v;
        }
        if let Some(v) = patch.auto_end_idle_on_activity {
            self.auto_end_idle_on_activity = v;
        }
    }

    /// Full patch carrying every field, used to re-sync a locally changed record.
    pub fn to_patch(&self) -> IdleSettingsPatch {
        IdleSettingsPatch {
            idle_threshold_minutes: Some(self.idle_threshold_minutes),
            warning_time_minutes: Some(self.warning_time_minutes),
            show_idle_warning: Some(self.show_idle_warning),
            enabled: Some(self.enabled),
            auto_end_idle_on_activity: Some(self.auto_end_idle_on_activity),
        }
    }
}

impl IdleSettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == IdleSettingsPatch::default()
    }
}

fn minutes_to_duration(minutes: f64) -> Duration {
    Duration::from_millis((minutes * MS_PER_MINUTE).round().max(0.0) as u64)
}

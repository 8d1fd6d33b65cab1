//! Duration formatting for tables and status lines.
//!
//! Two shapes are used across the tool:
//!
//! - `HH:MM` for break durations in tables ([`format_duration`])
//! - `HH:MM:SS` for idle totals, where a few seconds of idle time should
//!   still show up ([`format_std_duration`])
//!
//! Negative values are clamped to zero; nothing here can fail.
//!
//! ```rust
//! use idlewatch::libs::formatter::{format_duration, format_std_duration};
//!
//! assert_eq!(format_duration(&chrono::Duration::minutes(90)), "01:30");
//! assert_eq!(format_std_duration(std::time::Duration::from_secs(125)), "00:02:05");
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// One break row, pre-formatted for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedBreak {
    pub id: i64,
    /// `idle` or `manual`.
    pub trigger: String,
    pub start: String,
    /// `-` while the break is open.
    pub end: String,
    /// `--:--` while the break is open.
    pub duration: String,
    pub notes: String,
}

/// Formats a chrono duration as `HH:MM`.
///
/// ```rust
/// use idlewatch::libs::formatter::format_duration;
/// use chrono::Duration;
///
/// assert_eq!(format_duration(&Duration::hours(8)), "08:00");
/// assert_eq!(format_duration(&Duration::minutes(45)), "00:45");
/// assert_eq!(format_duration(&Duration::hours(-1)), "00:00");
/// ```
pub fn format_duration(duration: &Duration) -> String {
    let hours = duration.num_hours();
    let mins = duration.num_minutes() % 60;

    format!("{:02}:{:02}", hours.max(0), mins.max(0))
}

/// Formats a std duration as `HH:MM:SS`.
pub fn format_std_duration(duration: std::time::Duration) -> String {
    let total = duration.as_secs();
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Minutes as shown in settings: whole numbers without decimals.
pub fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{} min", minutes as i64)
    } else {
        format!("{:.1} min", minutes)
    }
}

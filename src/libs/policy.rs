//! Idle policy: maps elapsed idle time and settings to an [`IdleState`].
//!
//! The evaluator is a pure function with no clock or I/O of its own; the
//! coordinator feeds it the monitor's elapsed idle time on every tick.
//!
//! ```text
//!   Active ──▶ Warning ──▶ Idle
//!     ▲           │          │
//!     └───────────┴──────────┘   (input resumes)
//! ```
//!
//! Boundaries are inclusive: reaching a threshold exactly counts as crossing
//! it. When the warning window does not fit before the threshold the Idle
//! check wins and Warning is never produced.

use crate::libs::settings::IdleSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Classification of the employee at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    #[default]
    Active,
    Warning,
    Idle,
}

impl fmt::Display for IdleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IdleState::Active => "active",
            IdleState::Warning => "warning",
            IdleState::Idle => "idle",
        };
        write!(f, "{}", label)
    }
}

/// Computes the next state.
///
/// `current` only matters when resumed activity must not end an idle episode
/// on its own (`auto_end_idle_on_activity == false`): an Idle state then stays
/// Idle until it is ended manually.
pub fn evaluate(elapsed: Duration, settings: &IdleSettings, current: IdleState) -> IdleState {
    if !settings.enabled {
        return IdleState::Active;
    }

    if current == IdleState::Idle && !settings.auto_end_idle_on_activity {
        return IdleState::Idle;
    }

    if elapsed >= settings.idle_threshold() {
        return IdleState::Idle;
    }

    match settings.warning_start() {
        Some(start) if elapsed >= start => IdleState::Warning,
        _ => IdleState::Active,
    }
}

/// Convenience wrapper taking milliseconds.
pub fn evaluate_ms(elapsed_ms: u64, settings: &IdleSettings, current: IdleState) -> IdleState {
    evaluate(Duration::from_millis(elapsed_ms), settings, current)
}

//! Message macros with debug-aware output routing.
//!
//! Every user-facing line goes through one of these macros. In normal mode
//! they print to the terminal with an emoji prefix; when debug mode is on
//! (`IDLEWATCH_DEBUG` or `RUST_LOG` is set) the same text is sent to
//! `tracing` at the matching level, so the watcher's log and its console
//! output never diverge.
//!
//! ```text
//!   msg_info!(Message::X) ──▶ debug mode? ──yes──▶ tracing::info!("ℹ️ ...")
//!                                 │
//!                                 no ─────────▶ println!("ℹ️ ...")
//! ```
//!
//! | Macro                | Prefix | Normal mode | Debug mode        |
//! |----------------------|--------|-------------|-------------------|
//! | `msg_print!`         |        | stdout      | `tracing::info!`  |
//! | `msg_success!`       | ✅     | stdout      | `tracing::info!`  |
//! | `msg_info!`          | ℹ️     | stdout      | `tracing::info!`  |
//! | `msg_warning!`       | ⚠️     | stdout      | `tracing::warn!`  |
//! | `msg_error!`         | ❌     | stderr      | `tracing::error!` |
//! | `msg_debug!`         | 🔍     | suppressed  | `tracing::debug!` |
//!
//! `msg_error_anyhow!` and `msg_bail_anyhow!` build `anyhow` errors from a
//! message for the command layer.

use std::sync::OnceLock;

/// Cached result of the environment check.
static DEBUG_MODE: OnceLock<bool> = OnceLock::new();

/// Whether messages are routed to `tracing`.
///
/// Checked once per process: `IDLEWATCH_DEBUG` enables it explicitly,
/// `RUST_LOG` enables it because it implies a subscriber is wanted.
#[doc(hidden)]
pub fn is_debug_mode() -> bool {
    *DEBUG_MODE.get_or_init(|| std::env::var("IDLEWATCH_DEBUG").is_ok() || std::env::var("RUST_LOG").is_ok())
}

/// Prints a message without prefix.
///
/// ```rust,ignore
/// msg_print!(Message::StatusHeader, true);
/// ```
#[macro_export]
macro_rules! msg_print {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("{}", $msg);
        } else {
            println!("{}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\n{}\n", $msg);
        } else {
            println!("\n{}\n", $msg);
        }
    };
}

/// Prints a success confirmation with ✅ prefix.
#[macro_export]
macro_rules! msg_success {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("✅ {}", $msg);
        } else {
            println!("✅ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\n✅ {}\n", $msg);
        } else {
            println!("\n✅ {}\n", $msg);
        }
    };
}

/// Prints an error with ❌ prefix. Goes to stderr in normal mode.
#[macro_export]
macro_rules! msg_error {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::error!("❌ {}", $msg);
        } else {
            eprintln!("❌ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::error!("\n❌ {}\n", $msg);
        } else {
            eprintln!("\n❌ {}\n", $msg);
        }
    };
}

/// Prints a warning with ⚠️ prefix.
///
/// Used for conditions the watcher recovers from on its own, such as a
/// failed service call that will be retried on the next tick.
#[macro_export]
macro_rules! msg_warning {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::warn!("⚠️ {}", $msg);
        } else {
            println!("⚠️ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::warn!("\n⚠️ {}\n", $msg);
        } else {
            println!("\n⚠️ {}\n", $msg);
        }
    };
}

/// Prints an informational message with ℹ️ prefix.
#[macro_export]
macro_rules! msg_info {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("ℹ️ {}", $msg);
        } else {
            println!("ℹ️ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\nℹ️ {}\n", $msg);
        } else {
            println!("\nℹ️ {}\n", $msg);
        }
    };
}

/// Debug-only message with 🔍 prefix; nothing is printed in normal mode.
///
/// ```rust,ignore
/// msg_debug!(Message::IdleStateChanged("active".into(), "warning".into()));
/// ```
#[macro_export]
macro_rules! msg_debug {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::debug!("🔍 {}", $msg);
        }
    };
}

/// Builds an `anyhow::Error` from a message.
#[macro_export]
macro_rules! msg_error_anyhow {
    ($msg:expr) => {
        anyhow::anyhow!("❌ {}", $msg)
    };
}

/// Returns early with an `anyhow::Error` built from a message.
///
/// ```rust,ignore
/// fn employee(config: &Config) -> anyhow::Result<i64> {
///     match config.employee_id {
///         Some(id) => Ok(id),
///         None => msg_bail_anyhow!(Message::EmployeeNotConfigured),
///     }
/// }
/// ```
#[macro_export]
macro_rules! msg_bail_anyhow {
    ($msg:expr) => {
        anyhow::bail!("❌ {}", $msg)
    };
}

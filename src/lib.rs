//! # Idlewatch - inactivity detection for clinic work sessions
//!
//! Watches keyboard and mouse activity while an employee is clocked in. After
//! a configurable stretch without input the employee is marked idle and a
//! break session is recorded; when input resumes the break is closed.
//!
//! ## Layout
//!
//! - [`libs::activity`]: last-activity tracking over a pluggable input source
//! - [`libs::policy`]: pure Active / Warning / Idle evaluation
//! - [`libs::coordinator`]: evaluation loop and break bookkeeping
//! - [`db`] / [`api`]: local SQLite and clinic server backends
//! - [`commands`]: the `idlewatch` CLI
//!
//! ## Usage
//!
//! ```rust,no_run
//! use idlewatch::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod db;
pub mod libs;

//! Core library modules of the idle watcher.
//!
//! - **Idle detection**: `activity`, `input`, `policy`, `coordinator`
//! - **Domain**: `settings`, `services`, `error`
//! - **Infrastructure**: `config`, `data_storage`, `backend`, `daemon`, `messages`
//! - **Presentation**: `formatter`, `view`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use idlewatch::libs::activity::{ActivityMonitor, ManualSource};
//! use idlewatch::libs::backend;
//! use idlewatch::libs::coordinator::{CoordinatorOptions, SessionCoordinator};
//! use idlewatch::db::db::Db;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let services = backend::local(&Db::in_memory()?);
//! let monitor = ActivityMonitor::new(Arc::new(ManualSource::new()));
//! let coordinator = SessionCoordinator::new(monitor, services, CoordinatorOptions::default());
//! coordinator.initialize(42).await?;
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod backend;
pub mod config;
pub mod coordinator;
pub mod daemon;
pub mod data_storage;
pub mod error;
pub mod formatter;
pub mod input;
pub mod messages;
pub mod policy;
pub mod services;
pub mod settings;
pub mod view;

//! Chooses where sessions and settings live.
//!
//! With a `server` section in the configuration the clinic API is used;
//! otherwise everything is kept in the local SQLite database.

use crate::api::ClinicApi;
use crate::db::break_sessions::BreakSessions;
use crate::db::db::Db;
use crate::db::idle_settings::IdleSettingsStore;
use crate::db::work_sessions::WorkSessions;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::services::Services;
use crate::msg_debug;
use anyhow::Result;
use std::sync::Arc;

/// Services backed by the local database.
pub fn local(db: &Db) -> Services {
    Services {
        settings: Arc::new(IdleSettingsStore::new(db)),
        breaks: Arc::new(BreakSessions::new(db)),
        work_sessions: Arc::new(WorkSessions::new(db)),
    }
}

/// Services for the given configuration.
pub fn from_config(config: &Config) -> Result<Services> {
    match &config.server {
        Some(server) => {
            msg_debug!(Message::UsingClinicServer(server.api_url.clone()));
            Ok(Services::from_backend(Arc::new(ClinicApi::new(server))))
        }
        None => {
            msg_debug!(Message::UsingLocalDatabase);
            Ok(local(&Db::new()?))
        }
    }
}

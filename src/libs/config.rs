//! Application configuration for the idle watcher.
//!
//! The file lives next to the local database in the platform data directory
//! (see [`DataStorage`]) and is plain pretty-printed JSON. A missing file is not
//! an error: every section is optional and falls back to its defaults.
//!
//! ```json
//! {
//!   "employee_id": 42,
//!   "monitor": {
//!     "tick_interval_secs": 10,
//!     "activity_throttle_ms": 1000,
//!     "sync_error_after": 3,
//!     "session_check_secs": 30
//!   },
//!   "server": { "api_url": "https://clinic.example/api", "auth_token": "..." }
//! }
//! ```
//!
//! Per-employee idle thresholds are not stored here. They belong to the
//! employee record and are read through the settings service.

use super::data_storage::DataStorage;
use crate::libs::coordinator::CoordinatorOptions;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_print};
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// A section the setup wizard can configure.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Tuning of the local watcher process.
///
/// These values shape how often the watcher looks at the clock and the
/// network. The idle policy itself (thresholds, warning window) comes from
/// the employee's idle settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between two policy evaluations.
    ///
    /// Clamped to 1..=60. Smaller values make the warning and idle
    /// transitions more punctual at the cost of more wakeups.
    pub tick_interval_secs: u64,

    /// Minimum gap between two recorded input events, in milliseconds.
    ///
    /// Mouse movement produces hundreds of events per second; only the first
    /// one in each window updates the last-activity timestamp.
    pub activity_throttle_ms: u64,

    /// Consecutive failed service calls before the state reports a sync error.
    pub sync_error_after: u32,

    /// Seconds between checks that the work session is still open.
    pub session_check_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            tick_interval_secs: 10,
            activity_throttle_ms: 1000,
            sync_error_after: 3,
            session_check_secs: 30,
        }
    }
}

impl MonitorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.clamp(1, 60))
    }

    pub fn activity_throttle(&self) -> Duration {
        Duration::from_millis(self.activity_throttle_ms)
    }

    pub fn session_check_interval(&self) -> Duration {
        Duration::from_secs(self.session_check_secs.max(1))
    }

    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            tick_interval: self.tick_interval(),
            sync_error_after: self.sync_error_after.max(1),
        }
    }
}

/// Clinic server connection. When present, sessions and settings are kept on
/// the server instead of the local database.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Base URL of the clinic API, without trailing slash.
    pub api_url: String,

    /// Bearer token sent with every request.
    pub auth_token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    /// Employee whose sessions this installation tracks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor: Option<MonitorConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
}

impl Config {
    /// Reads the configuration from the default data directory.
    pub fn read() -> Result<Config> {
        Self::read_from(&DataStorage::new())
    }

    pub fn read_from(storage: &DataStorage) -> Result<Config> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&DataStorage::new())
    }

    pub fn save_to(&self, storage: &DataStorage) -> Result<()> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Watcher tuning with defaults filled in.
    pub fn monitor(&self) -> MonitorConfig {
        self.monitor.clone().unwrap_or_default()
    }

    /// The configured employee, or an error telling the user to run `init`.
    pub fn employee(&self) -> Result<i64> {
        match self.employee_id {
            Some(id) => Ok(id),
            None => msg_bail_anyhow!(Message::EmployeeNotConfigured),
        }
    }

    /// Interactive setup wizard, starting from the current configuration.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![
            ConfigModule {
                key: "employee".to_string(),
                name: "Employee".to_string(),
            },
            ConfigModule {
                key: "monitor".to_string(),
                name: "Monitor".to_string(),
            },
            ConfigModule {
                key: "server".to_string(),
                name: "Server".to_string(),
            },
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "employee" => {
                    msg_print!(Message::ConfigModuleEmployee);
                    let theme = ColorfulTheme::default();
                    let mut input = Input::<i64>::with_theme(&theme).with_prompt(Message::PromptEmployeeId.to_string());
                    if let Some(id) = config.employee_id {
                        input = input.default(id);
                    }
                    config.employee_id = Some(input.interact_text()?);
                }
                "monitor" => {
                    let default = config.monitor();
                    msg_print!(Message::ConfigModuleMonitor);
                    config.monitor = Some(MonitorConfig {
                        tick_interval_secs: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptTickInterval.to_string())
                            .default(default.tick_interval_secs)
                            .interact_text()?,
                        activity_throttle_ms: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptActivityThrottle.to_string())
                            .default(default.activity_throttle_ms)
                            .interact_text()?,
                        sync_error_after: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptSyncErrorAfter.to_string())
                            .default(default.sync_error_after)
                            .interact_text()?,
                        session_check_secs: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptSessionCheck.to_string())
                            .default(default.session_check_secs)
                            .interact_text()?,
                    });
                }
                "server" => {
                    let default = config.server.clone().unwrap_or(ServerConfig {
                        api_url: "".to_string(),
                        auth_token: "".to_string(),
                    });
                    msg_print!(Message::ConfigModuleServer);
                    let api_url: String = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptServerApiUrl.to_string())
                        .default(default.api_url)
                        .allow_empty(true)
                        .interact_text()?;
                    let auth_token: String = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptServerAuthToken.to_string())
                        .default(default.auth_token)
                        .allow_empty(true)
                        .interact_text()?;
                    // An empty URL switches back to the local database.
                    config.server = if api_url.trim().is_empty() {
                        None
                    } else {
                        Some(ServerConfig {
                            api_url: api_url.trim().trim_end_matches('/').to_string(),
                            auth_token,
                        })
                    };
                }
                _ => {}
            }
        }

        Ok(config)
    }
}

use crate::db::db::Db;
use crate::libs::error::ServiceError;
use crate::libs::services::SettingsService;
use crate::libs::settings::{IdleSettings, IdleSettingsPatch};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;

const SELECT_COLUMNS: &str = "SELECT id, employee_id, idle_threshold_minutes, warning_time_minutes, show_idle_warning, enabled, auto_end_idle_on_activity FROM idle_settings";

// A second create for the same employee keeps the first record.
const INSERT_SETTINGS: &str = "INSERT INTO idle_settings
    (employee_id, idle_threshold_minutes, warning_time_minutes, show_idle_warning, enabled, auto_end_idle_on_activity)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(employee_id) DO NOTHING";

const UPDATE_SETTINGS: &str = "UPDATE idle_settings SET
    idle_threshold_minutes = ?1,
    warning_time_minutes = ?2,
    show_idle_warning = ?3,
    enabled = ?4,
    auto_end_idle_on_activity = ?5,
    updated_at = CURRENT_TIMESTAMP
    WHERE id = ?6";

/// Idle settings records in the local database.
pub struct IdleSettingsStore {
    pub conn: Arc<Mutex<Connection>>,
}

impl IdleSettingsStore {
    pub fn new(db: &Db) -> Self {
        IdleSettingsStore { conn: db.conn.clone() }
    }

    fn by_employee(conn: &Connection, employee_id: i64) -> Result<Option<IdleSettings>, ServiceError> {
        let sql = format!("{} WHERE employee_id = ?1", SELECT_COLUMNS);
        Ok(conn.query_row(&sql, [employee_id], map_settings).optional()?)
    }

    fn update(&self, settings_id: i64, patch: &IdleSettingsPatch) -> Result<(), ServiceError> {
        let conn = self.conn.lock();
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let mut settings = conn
            .query_row(&sql, [settings_id], map_settings)
            .optional()?
            .ok_or(ServiceError::NotFound {
                entity: "idle settings",
                id: settings_id,
            })?;

        settings.apply(patch);
        conn.execute(
            UPDATE_SETTINGS,
            params![
                settings.idle_threshold_minutes,
                settings.warning_time_minutes,
                settings.show_idle_warning,
                settings.enabled,
                settings.auto_end_idle_on_activity,
                settings_id
            ],
        )?;
        Ok(())
    }
}

fn map_settings(row: &Row<'_>) -> rusqlite::Result<IdleSettings> {
    Ok(IdleSettings {
        id: Some(row.get(0)?),
        employee_id: row.get(1)?,
        idle_threshold_minutes: row.get(2)?,
        warning_time_minutes: row.get(3)?,
        show_idle_warning: row.get(4)?,
        enabled: row.get(5)?,
        auto_end_idle_on_activity: row.get(6)?,
    })
}

#[async_trait]
impl SettingsService for IdleSettingsStore {
    async fn get_idle_settings(&self, employee_id: i64) -> Result<Option<IdleSettings>, ServiceError> {
        let conn = self.conn.lock();
        Self::by_employee(&conn, employee_id)
    }

    async fn create_idle_settings(&self, employee_id: i64, defaults: &IdleSettings) -> Result<IdleSettings, ServiceError> {
        let conn = self.conn.lock();
        conn.execute(
            INSERT_SETTINGS,
            params![
                employee_id,
                defaults.idle_threshold_minutes,
                defaults.warning_time_minutes,
                defaults.show_idle_warning,
                defaults.enabled,
                defaults.auto_end_idle_on_activity
            ],
        )?;
        Self::by_employee(&conn, employee_id)?.ok_or(ServiceError::NotFound {
            entity: "idle settings for employee",
            id: employee_id,
        })
    }

    async fn update_idle_settings(&self, settings_id: i64, patch: &IdleSettingsPatch) -> Result<(), ServiceError> {
        self.update(settings_id, patch)
    }
}

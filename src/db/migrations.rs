//! Versioned schema migrations for the local database.
//!
//! Each migration has a version, a name and an `up` function that runs inside
//! the shared transaction. Applied versions are recorded in the `migrations`
//! table, so opening a database only runs what is missing.
//!
//! New migrations go at the end of [`MigrationManager::register_migrations`]
//! with the next version number. Existing migrations are never edited.

use crate::libs::messages::Message;
use crate::{msg_debug, msg_error, msg_info};
use anyhow::Result;
use rusqlite::{params, Connection, Transaction};

const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Debug, Clone)]
struct Migration {
    version: u32,
    name: &'static str,
    up: fn(&Transaction) -> Result<()>,
}

pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        // Version 1: work sessions, one open session per employee
        self.add_migration(1, "create_work_sessions", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS work_sessions (
                    id INTEGER PRIMARY KEY,
                    employee_id INTEGER NOT NULL,
                    clock_in TIMESTAMP NOT NULL,
                    clock_out TIMESTAMP
                )",
                [],
            )?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_work_sessions_employee ON work_sessions(employee_id)", [])?;
            tx.execute(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_work_sessions_open ON work_sessions(employee_id) WHERE clock_out IS NULL",
                [],
            )?;
            Ok(())
        });

        // Version 2: breaks inside a work session, one open break per session
        self.add_migration(2, "create_break_sessions", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS break_sessions (
                    id INTEGER PRIMARY KEY,
                    work_session_id INTEGER NOT NULL,
                    trigger_type TEXT NOT NULL CHECK (trigger_type IN ('idle', 'manual')),
                    notes TEXT,
                    start_time TIMESTAMP NOT NULL,
                    end_time TIMESTAMP,
                    duration INTEGER,
                    FOREIGN KEY (work_session_id) REFERENCES work_sessions(id) ON DELETE CASCADE
                )",
                [],
            )?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_break_sessions_start ON break_sessions(start_time)", [])?;
            tx.execute(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_break_sessions_open ON break_sessions(work_session_id) WHERE end_time IS NULL",
                [],
            )?;
            Ok(())
        });

        // Version 3: per-employee idle settings
        self.add_migration(3, "create_idle_settings", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS idle_settings (
                    id INTEGER PRIMARY KEY,
                    employee_id INTEGER NOT NULL UNIQUE,
                    idle_threshold_minutes REAL NOT NULL,
                    warning_time_minutes REAL NOT NULL,
                    show_idle_warning BOOLEAN NOT NULL DEFAULT TRUE,
                    enabled BOOLEAN NOT NULL DEFAULT TRUE,
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
                [],
            )?;
            Ok(())
        });

        // Version 4: opt-out of ending idle episodes on resumed input
        self.add_migration(4, "add_auto_end_idle_on_activity", |tx| {
            tx.execute(
                "ALTER TABLE idle_settings ADD COLUMN auto_end_idle_on_activity BOOLEAN NOT NULL DEFAULT TRUE",
                [],
            )?;
            Ok(())
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    /// Applies all pending migrations in one transaction.
    pub fn run_migrations(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;

        let current_version = self.get_current_version(conn)?;
        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();

        if pending.is_empty() {
            msg_debug!(Message::DatabaseUpToDate(current_version));
            return Ok(());
        }

        msg_debug!(Message::MigrationsFound(pending.len()));
        let tx = conn.transaction()?;

        for migration in pending {
            msg_debug!(Message::RunningMigration(migration.version, migration.name.to_string()));

            if let Err(e) = (migration.up)(&tx) {
                msg_error!(Message::MigrationFailed(migration.version, e.to_string()));
                return Err(e);
            }
            tx.execute(
                "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                params![migration.version, migration.name],
            )?;
        }

        tx.commit()?;
        msg_info!(Message::DatabaseMigrated(self.latest_version()));
        Ok(())
    }

    fn get_current_version(&self, conn: &Connection) -> Result<u32> {
        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))
            .unwrap_or(Some(0));

        Ok(version.unwrap_or(0))
    }

    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    pub fn is_migration_applied(&self, conn: &Connection, version: u32) -> Result<bool> {
        let count: i32 = conn.query_row("SELECT COUNT(*) FROM migrations WHERE version = ?1", params![version], |row| row.get(0))?;

        Ok(count > 0)
    }

    /// `(version, name, applied_at)` rows in version order.
    pub fn get_migration_history(&self, conn: &Connection) -> Result<Vec<(u32, String, String)>> {
        let mut stmt = conn.prepare("SELECT version, name, applied_at FROM migrations ORDER BY version")?;

        let history = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(history)
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_with_migrations(conn: &mut Connection) -> Result<()> {
    MigrationManager::new().run_migrations(conn)
}

pub fn get_db_version(conn: &Connection) -> Result<u32> {
    MigrationManager::new().get_current_version(conn)
}

pub fn needs_migration(conn: &Connection) -> Result<bool> {
    let manager = MigrationManager::new();
    let current = manager.get_current_version(conn)?;
    Ok(current < manager.latest_version())
}

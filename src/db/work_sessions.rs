use crate::db::break_sessions::{active_break, close_break};
use crate::db::db::Db;
use crate::db::now;
use crate::libs::error::ServiceError;
use crate::libs::services::{WorkSession, WorkSessionService};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;

const SELECT_COLUMNS: &str = "SELECT id, employee_id, clock_in, clock_out FROM work_sessions";

const INSERT_WORK_SESSION: &str = "INSERT INTO work_sessions (employee_id, clock_in) VALUES (?1, ?2)";

const CLOSE_WORK_SESSION: &str = "UPDATE work_sessions SET clock_out = ?1 WHERE id = ?2 AND clock_out IS NULL";

/// Work sessions in the local database.
pub struct WorkSessions {
    pub conn: Arc<Mutex<Connection>>,
}

impl WorkSessions {
    pub fn new(db: &Db) -> Self {
        WorkSessions { conn: db.conn.clone() }
    }

    pub fn get(&self, id: i64) -> Result<Option<WorkSession>, ServiceError> {
        let conn = self.conn.lock();
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        Ok(conn.query_row(&sql, [id], map_work_session).optional()?)
    }

    fn active(conn: &Connection, employee_id: i64) -> Result<Option<WorkSession>, ServiceError> {
        let sql = format!(
            "{} WHERE employee_id = ?1 AND clock_out IS NULL ORDER BY id DESC LIMIT 1",
            SELECT_COLUMNS
        );
        Ok(conn.query_row(&sql, [employee_id], map_work_session).optional()?)
    }

    fn open(&self, employee_id: i64) -> Result<WorkSession, ServiceError> {
        let conn = self.conn.lock();
        if let Some(existing) = Self::active(&conn, employee_id)? {
            return Err(ServiceError::Conflict(format!(
                "employee {} is already clocked in (work session {})",
                employee_id, existing.id
            )));
        }

        let clock_in = now();
        conn.execute(INSERT_WORK_SESSION, params![employee_id, clock_in])?;
        Ok(WorkSession {
            id: conn.last_insert_rowid(),
            employee_id,
            clock_in,
            clock_out: None,
        })
    }

    fn close(&self, work_session_id: i64) -> Result<(), ServiceError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let session = tx.query_row(&sql, [work_session_id], map_work_session).optional()?;
        match session {
            None => {
                return Err(ServiceError::NotFound {
                    entity: "work session",
                    id: work_session_id,
                })
            }
            Some(s) if !s.is_open() => {
                return Err(ServiceError::Conflict(format!("work session {} is already closed", work_session_id)))
            }
            Some(_) => {}
        }

        let clock_out = now();
        if let Some(open) = active_break(&tx, work_session_id)? {
            close_break(&tx, &open, clock_out)?;
        }
        tx.execute(CLOSE_WORK_SESSION, params![clock_out, work_session_id])?;
        tx.commit()?;
        Ok(())
    }
}

fn map_work_session(row: &Row<'_>) -> rusqlite::Result<WorkSession> {
    Ok(WorkSession {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        clock_in: row.get(2)?,
        clock_out: row.get(3)?,
    })
}

#[async_trait]
impl WorkSessionService for WorkSessions {
    async fn get_active_work_session(&self, employee_id: i64) -> Result<Option<WorkSession>, ServiceError> {
        let conn = self.conn.lock();
        Self::active(&conn, employee_id)
    }

    async fn clock_in(&self, employee_id: i64) -> Result<WorkSession, ServiceError> {
        self.open(employee_id)
    }

    async fn clock_out(&self, work_session_id: i64) -> Result<(), ServiceError> {
        self.close(work_session_id)
    }
}

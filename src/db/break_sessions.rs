use crate::db::db::Db;
use crate::db::now;
use crate::libs::error::ServiceError;
use crate::libs::services::{BreakRequest, BreakService, BreakSession, BreakTrigger};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;

const SELECT_COLUMNS: &str = "SELECT id, work_session_id, trigger_type, start_time, end_time, duration, notes FROM break_sessions";

const INSERT_BREAK: &str = "INSERT INTO break_sessions (work_session_id, trigger_type, notes, start_time) VALUES (?1, ?2, ?3, ?4)";

const CLOSE_BREAK: &str = "UPDATE break_sessions SET end_time = ?1, duration = ?2 WHERE id = ?3 AND end_time IS NULL";

const SELECT_WORK_SESSION_STATE: &str = "SELECT clock_out IS NULL FROM work_sessions WHERE id = ?1";

/// Break sessions in the local database.
pub struct BreakSessions {
    pub conn: Arc<Mutex<Connection>>,
}

impl BreakSessions {
    pub fn new(db: &Db) -> Self {
        BreakSessions { conn: db.conn.clone() }
    }

    pub fn get(&self, id: i64) -> Result<Option<BreakSession>, ServiceError> {
        let conn = self.conn.lock();
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        Ok(conn.query_row(&sql, [id], map_break).optional()?)
    }

    /// Breaks started on `date`, across all work sessions.
    pub fn breaks_for_date(&self, date: NaiveDate) -> Result<Vec<BreakSession>, ServiceError> {
        let conn = self.conn.lock();
        let sql = format!("{} WHERE date(start_time) = ?1 ORDER BY start_time, id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let breaks = stmt
            .query_map([date.format("%Y-%m-%d").to_string()], map_break)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(breaks)
    }

    fn start(&self, work_session_id: i64, request: &BreakRequest) -> Result<i64, ServiceError> {
        let conn = self.conn.lock();

        let open: Option<bool> = conn.query_row(SELECT_WORK_SESSION_STATE, [work_session_id], |row| row.get(0)).optional()?;
        match open {
            None => {
                return Err(ServiceError::NotFound {
                    entity: "work session",
                    id: work_session_id,
                })
            }
            Some(false) => return Err(ServiceError::Conflict(format!("work session {} is closed", work_session_id))),
            Some(true) => {}
        }

        if let Some(active) = active_break(&conn, work_session_id)? {
            return Err(ServiceError::Conflict(format!(
                "break {} is already open in work session {}",
                active.id, work_session_id
            )));
        }

        conn.execute(
            INSERT_BREAK,
            params![work_session_id, request.trigger.as_str(), request.notes, now()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn end(&self, break_session_id: i64) -> Result<(), ServiceError> {
        let conn = self.conn.lock();
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let existing = conn.query_row(&sql, [break_session_id], map_break).optional()?;

        match existing {
            None => Err(ServiceError::NotFound {
                entity: "break",
                id: break_session_id,
            }),
            // Ending twice is not an error.
            Some(b) if !b.is_open() => Ok(()),
            Some(b) => {
                close_break(&conn, &b, now())?;
                Ok(())
            }
        }
    }
}

/// Open break of a work session, if any.
pub(crate) fn active_break(conn: &Connection, work_session_id: i64) -> Result<Option<BreakSession>, ServiceError> {
    let sql = format!(
        "{} WHERE work_session_id = ?1 AND end_time IS NULL ORDER BY id DESC LIMIT 1",
        SELECT_COLUMNS
    );
    Ok(conn.query_row(&sql, [work_session_id], map_break).optional()?)
}

pub(crate) fn close_break(conn: &Connection, open: &BreakSession, end: NaiveDateTime) -> Result<(), ServiceError> {
    let duration = (end - open.start).num_seconds().max(0);
    conn.execute(CLOSE_BREAK, params![end, duration, open.id])?;
    Ok(())
}

fn map_break(row: &Row<'_>) -> rusqlite::Result<BreakSession> {
    let trigger: String = row.get(2)?;
    let trigger = trigger
        .parse::<BreakTrigger>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(BreakSession {
        id: row.get(0)?,
        work_session_id: row.get(1)?,
        trigger,
        start: row.get(3)?,
        end: row.get(4)?,
        duration_secs: row.get(5)?,
        notes: row.get(6)?,
    })
}

#[async_trait]
impl BreakService for BreakSessions {
    async fn start_break(&self, work_session_id: i64, request: &BreakRequest) -> Result<i64, ServiceError> {
        self.start(work_session_id, request)
    }

    async fn end_break(&self, break_session_id: i64) -> Result<(), ServiceError> {
        self.end(break_session_id)
    }

    async fn get_active_break(&self, work_session_id: i64) -> Result<Option<BreakSession>, ServiceError> {
        let conn = self.conn.lock();
        active_break(&conn, work_session_id)
    }

    async fn list_breaks(&self, work_session_id: i64) -> Result<Vec<BreakSession>, ServiceError> {
        let conn = self.conn.lock();
        let sql = format!("{} WHERE work_session_id = ?1 ORDER BY start_time, id", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let breaks = stmt.query_map([work_session_id], map_break)?.collect::<Result<Vec<_>, _>>()?;
        Ok(breaks)
    }
}

use crate::db::migrations::init_with_migrations;
use crate::libs::data_storage::DataStorage;
use anyhow::Result;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

pub const DB_FILE_NAME: &str = "idlewatch.db";

/// Shared handle to the local database. Cloning shares the connection.
#[derive(Clone)]
pub struct Db {
    pub conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Opens the database in the default data directory.
    pub fn new() -> Result<Db> {
        Self::open(DataStorage::new().get_path(DB_FILE_NAME)?)
    }

    /// Opens (or creates) the database at `path` and brings the schema up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Db> {
        Self::prepare(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Db> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(mut conn: Connection) -> Result<Db> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        init_with_migrations(&mut conn)?;
        Ok(Db {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

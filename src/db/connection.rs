use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::TasknestError;

use super::migrations;

/// Open a connection to an existing database. Returns an error if the
/// database has not been initialized.
pub fn open_db(path: &Path) -> Result<Connection, TasknestError> {
    if !path.exists() {
        return Err(TasknestError::database(format!(
            "database not initialized at {}",
            path.display()
        )));
    }
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Initialize the database: create parent directories, run migrations, and
/// return a ready connection.
pub fn init_db(path: &Path) -> Result<Connection, TasknestError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TasknestError::database(e.to_string()))?;
    }
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Default database location under a data directory.
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("tasknest").join("tasknest.db")
}

fn configure_connection(conn: &Connection) -> Result<(), TasknestError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

use rusqlite::Connection;

use crate::error::TasknestError;

pub fn run_migrations(conn: &Connection) -> Result<(), TasknestError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            title TEXT NOT NULL,
            details TEXT,
            due_date TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            completed_on TEXT,
            source_routine TEXT,
            materialized_for TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS routines (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            title TEXT NOT NULL,
            details TEXT,
            rule TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- At most one materialized task per (owner, routine, date). The
        -- engine's insert-if-absent rides on this index; directly created
        -- tasks (source_routine NULL) stay unconstrained.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_materialized
            ON tasks(owner, source_routine, materialized_for)
            WHERE source_routine IS NOT NULL;

        CREATE INDEX IF NOT EXISTS idx_tasks_owner_due ON tasks(owner, completed, due_date);
        CREATE INDEX IF NOT EXISTS idx_routines_owner ON routines(owner);
        ",
    )?;
    Ok(())
}

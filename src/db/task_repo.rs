use chrono::{Duration, NaiveDate};
use rusqlite::{params, params_from_iter, Connection};

use crate::error::TasknestError;
use crate::models::{Scope, Task};

const TASK_COLUMNS: &str = "id, owner, title, details, due_date, completed, completed_on,
                source_routine, materialized_for, created_at, updated_at";

// Incomplete before complete, then earliest due date first.
const TASK_ORDER: &str = "ORDER BY completed ASC, due_date ASC, id ASC";

pub fn create_task(
    conn: &Connection,
    id: &str,
    owner: &str,
    title: &str,
    details: Option<&str>,
    due_date: NaiveDate,
) -> Result<Task, TasknestError> {
    conn.execute(
        "INSERT INTO tasks (id, owner, title, details, due_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, owner, title, details, due_date.to_string()],
    )?;
    get_task(conn, owner, id)
}

/// Insert-if-absent for the materialization engine. Rides on the partial
/// unique index over (owner, source_routine, materialized_for), so the
/// check-then-act is a single atomic statement even under concurrent
/// callers. Returns whether a row was actually created.
pub fn materialize_task(
    conn: &Connection,
    id: &str,
    owner: &str,
    title: &str,
    details: Option<&str>,
    target_date: NaiveDate,
    routine_id: &str,
) -> Result<bool, TasknestError> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO tasks
             (id, owner, title, details, due_date, source_routine, materialized_for)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            owner,
            title,
            details,
            target_date.to_string(),
            routine_id,
            target_date.to_string()
        ],
    )?;
    Ok(changed > 0)
}

/// Fetch one task scoped to its owner. A foreign owner's id surfaces as
/// not-found, never as a distinct "forbidden".
pub fn get_task(conn: &Connection, owner: &str, id: &str) -> Result<Task, TasknestError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND owner = ?2");
    conn.query_row(&sql, params![id, owner], row_to_task)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => TasknestError::task_not_found(id),
            _ => TasknestError::from(e),
        })
}

pub fn list_scope(
    conn: &Connection,
    owner: &str,
    scope: Scope,
    today: NaiveDate,
    limit: i64,
    offset: i64,
) -> Result<Vec<Task>, TasknestError> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE owner = ?1 {} {TASK_ORDER}
         LIMIT {limit} OFFSET {offset}",
        scope_clause(scope)
    );
    let mut stmt = conn.prepare(&sql)?;
    let tasks = stmt
        .query_map(params_from_iter(scope_params(owner, scope, today)), row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// (total, completed) over the unpaginated filtered set.
pub fn scope_counts(
    conn: &Connection,
    owner: &str,
    scope: Scope,
    today: NaiveDate,
) -> Result<(i64, i64), TasknestError> {
    let sql = format!(
        "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM tasks WHERE owner = ?1 {}",
        scope_clause(scope)
    );
    let counts = conn.query_row(
        &sql,
        params_from_iter(scope_params(owner, scope, today)),
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
    )?;
    Ok(counts)
}

pub fn update_task_fields(
    conn: &Connection,
    owner: &str,
    id: &str,
    title: &str,
    details: Option<&str>,
    due_date: NaiveDate,
) -> Result<Task, TasknestError> {
    let changed = conn.execute(
        "UPDATE tasks SET title = ?1, details = ?2, due_date = ?3,
             updated_at = datetime('now')
         WHERE id = ?4 AND owner = ?5",
        params![title, details, due_date.to_string(), id, owner],
    )?;
    if changed == 0 {
        return Err(TasknestError::task_not_found(id));
    }
    get_task(conn, owner, id)
}

pub fn set_completion(
    conn: &Connection,
    owner: &str,
    id: &str,
    completed: bool,
    completed_on: Option<NaiveDate>,
) -> Result<Task, TasknestError> {
    let changed = conn.execute(
        "UPDATE tasks SET completed = ?1, completed_on = ?2,
             updated_at = datetime('now')
         WHERE id = ?3 AND owner = ?4",
        params![completed, completed_on.map(|d| d.to_string()), id, owner],
    )?;
    if changed == 0 {
        return Err(TasknestError::task_not_found(id));
    }
    get_task(conn, owner, id)
}

pub fn delete_task(conn: &Connection, owner: &str, id: &str) -> Result<(), TasknestError> {
    let changed = conn.execute(
        "DELETE FROM tasks WHERE id = ?1 AND owner = ?2",
        params![id, owner],
    )?;
    if changed == 0 {
        return Err(TasknestError::task_not_found(id));
    }
    Ok(())
}

pub fn tasks_by_ids(
    conn: &Connection,
    owner: &str,
    ids: &[String],
) -> Result<Vec<Task>, TasknestError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE owner = ?1 AND id IN ({}) {TASK_ORDER}",
        id_placeholders(2, ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut bind: Vec<String> = Vec::with_capacity(ids.len() + 1);
    bind.push(owner.to_string());
    bind.extend(ids.iter().cloned());
    let tasks = stmt
        .query_map(params_from_iter(bind), row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn bulk_update_due_date(
    conn: &Connection,
    owner: &str,
    ids: &[String],
    due_date: NaiveDate,
) -> Result<usize, TasknestError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "UPDATE tasks SET due_date = ?{}, updated_at = datetime('now')
         WHERE owner = ?1 AND id IN ({})",
        ids.len() + 2,
        id_placeholders(2, ids.len())
    );
    let mut bind: Vec<String> = Vec::with_capacity(ids.len() + 2);
    bind.push(owner.to_string());
    bind.extend(ids.iter().cloned());
    bind.push(due_date.to_string());
    let changed = conn.execute(&sql, params_from_iter(bind))?;
    Ok(changed)
}

pub fn bulk_delete(
    conn: &Connection,
    owner: &str,
    ids: &[String],
) -> Result<usize, TasknestError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "DELETE FROM tasks WHERE owner = ?1 AND id IN ({})",
        id_placeholders(2, ids.len())
    );
    let mut bind: Vec<String> = Vec::with_capacity(ids.len() + 1);
    bind.push(owner.to_string());
    bind.extend(ids.iter().cloned());
    let changed = conn.execute(&sql, params_from_iter(bind))?;
    Ok(changed)
}

/// Flip each matched task from its own prior state. A task toggling to
/// complete gets `completed_on = today`; toggling back clears it. The CASE
/// expressions read the pre-update row, so the flip is per-task and atomic.
pub fn bulk_toggle(
    conn: &Connection,
    owner: &str,
    ids: &[String],
    today: NaiveDate,
) -> Result<usize, TasknestError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "UPDATE tasks SET
             completed = CASE WHEN completed = 0 THEN 1 ELSE 0 END,
             completed_on = CASE WHEN completed = 0 THEN ?{} ELSE NULL END,
             updated_at = datetime('now')
         WHERE owner = ?1 AND id IN ({})",
        ids.len() + 2,
        id_placeholders(2, ids.len())
    );
    let mut bind: Vec<String> = Vec::with_capacity(ids.len() + 2);
    bind.push(owner.to_string());
    bind.extend(ids.iter().cloned());
    bind.push(today.to_string());
    let changed = conn.execute(&sql, params_from_iter(bind))?;
    Ok(changed)
}

fn scope_clause(scope: Scope) -> &'static str {
    match scope {
        // Due today, plus anything overdue and still incomplete.
        Scope::Today => "AND (due_date = ?2 OR (due_date < ?2 AND completed = 0))",
        Scope::Upcoming => "AND due_date >= ?2 AND due_date <= ?3",
        Scope::All => "",
    }
}

fn scope_params(owner: &str, scope: Scope, today: NaiveDate) -> Vec<String> {
    match scope {
        Scope::All => vec![owner.to_string()],
        Scope::Today => vec![owner.to_string(), today.to_string()],
        Scope::Upcoming => vec![
            owner.to_string(),
            today.to_string(),
            (today + Duration::days(7)).to_string(),
        ],
    }
}

fn id_placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        owner: row.get(1)?,
        title: row.get(2)?,
        details: row.get(3)?,
        due_date: date_col(row, 4)?,
        completed: row.get(5)?,
        completed_on: opt_date_col(row, 6)?,
        source_routine: row.get(7)?,
        materialized_for: opt_date_col(row, 8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn date_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    parse_stored_date(&raw, idx)
}

fn opt_date_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_stored_date(&s, idx)).transpose()
}

fn parse_stored_date(raw: &str, idx: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

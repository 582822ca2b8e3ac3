use rusqlite::{params, Connection};

use crate::error::TasknestError;
use crate::models::{RecurrenceRule, Routine};

const ROUTINE_COLUMNS: &str = "id, owner, title, details, rule, created_at";

pub fn create_routine(
    conn: &Connection,
    id: &str,
    owner: &str,
    title: &str,
    details: Option<&str>,
    rule: &RecurrenceRule,
) -> Result<Routine, TasknestError> {
    let rule_json = encode_rule(rule)?;
    conn.execute(
        "INSERT INTO routines (id, owner, title, details, rule)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, owner, title, details, rule_json],
    )?;
    get_routine(conn, owner, id)
}

pub fn get_routine(conn: &Connection, owner: &str, id: &str) -> Result<Routine, TasknestError> {
    let sql = format!("SELECT {ROUTINE_COLUMNS} FROM routines WHERE id = ?1 AND owner = ?2");
    conn.query_row(&sql, params![id, owner], row_to_routine)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => TasknestError::routine_not_found(id),
            _ => TasknestError::from(e),
        })
}

pub fn list_routines(conn: &Connection, owner: &str) -> Result<Vec<Routine>, TasknestError> {
    let sql = format!(
        "SELECT {ROUTINE_COLUMNS} FROM routines WHERE owner = ?1 ORDER BY created_at ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let routines = stmt
        .query_map(params![owner], row_to_routine)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(routines)
}

/// Replace a routine's template and rule. Already-materialized tasks keep
/// the template they were created with.
pub fn update_routine(
    conn: &Connection,
    owner: &str,
    id: &str,
    title: &str,
    details: Option<&str>,
    rule: &RecurrenceRule,
) -> Result<Routine, TasknestError> {
    let rule_json = encode_rule(rule)?;
    let changed = conn.execute(
        "UPDATE routines SET title = ?1, details = ?2, rule = ?3
         WHERE id = ?4 AND owner = ?5",
        params![title, details, rule_json, id, owner],
    )?;
    if changed == 0 {
        return Err(TasknestError::routine_not_found(id));
    }
    get_routine(conn, owner, id)
}

/// Delete a routine. Tasks it already materialized are left in place and
/// become ordinary standalone tasks.
pub fn delete_routine(conn: &Connection, owner: &str, id: &str) -> Result<(), TasknestError> {
    let changed = conn.execute(
        "DELETE FROM routines WHERE id = ?1 AND owner = ?2",
        params![id, owner],
    )?;
    if changed == 0 {
        return Err(TasknestError::routine_not_found(id));
    }
    Ok(())
}

fn encode_rule(rule: &RecurrenceRule) -> Result<String, TasknestError> {
    serde_json::to_string(rule).map_err(|e| TasknestError::database(e.to_string()))
}

fn row_to_routine(row: &rusqlite::Row) -> rusqlite::Result<Routine> {
    let rule_raw: String = row.get(4)?;
    let rule: RecurrenceRule = serde_json::from_str(&rule_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Routine {
        id: row.get(0)?,
        owner: row.get(1)?,
        title: row.get(2)?,
        details: row.get(3)?,
        rule,
        created_at: row.get(5)?,
    })
}

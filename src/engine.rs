//! Routine materialization engine.
//!
//! Expands a user's routines into concrete task records for one target
//! date. Idempotent: the insert-if-absent in `task_repo::materialize_task`
//! is keyed on (owner, routine, date), so repeat calls and concurrent
//! callers converge on the same task set.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::{routine_repo, task_repo};
use crate::error::TasknestError;

/// Ensure every routine of `owner` firing on `target_date` has exactly one
/// materialized task. Returns the number of tasks created (zero on a
/// no-op re-run).
///
/// Templates are copied at materialization time; later edits or deletion
/// of the routine never touch tasks created here. A failure on one routine
/// is logged and skipped so the rest still materialize — the next call
/// self-heals the gap.
pub fn apply_routines(
    conn: &Connection,
    owner: &str,
    target_date: NaiveDate,
) -> Result<usize, TasknestError> {
    let routines = routine_repo::list_routines(conn, owner)?;
    let firing: Vec<_> = routines
        .iter()
        .filter(|r| r.rule.fires_on(target_date))
        .collect();
    if firing.is_empty() {
        return Ok(0);
    }

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let mut created = 0;
    for routine in firing {
        let task_id = ulid::Ulid::new().to_string();
        match task_repo::materialize_task(
            conn,
            &task_id,
            owner,
            &routine.title,
            routine.details.as_deref(),
            target_date,
            &routine.id,
        ) {
            Ok(true) => created += 1,
            Ok(false) => {} // already materialized for this date
            Err(e) => {
                log::warn!(
                    "materialization skipped routine {} for {target_date}: {e}",
                    routine.id
                );
            }
        }
    }
    conn.execute_batch("COMMIT")?;

    if created > 0 {
        log::debug!("materialized {created} task(s) for {owner} on {target_date}");
    }
    Ok(created)
}

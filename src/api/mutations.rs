//! Task mutation API: create, update, delete, toggle-complete, single and
//! bulk. Every operation is owner-scoped and returns fresh counts for a
//! caller-chosen scope so clients can refresh their summary without a
//! second round trip.

use chrono::Local;
use rusqlite::Connection;

use crate::api::response::{DeleteResponse, TaskBatchResponse, TaskResponse};
use crate::api::views::counts_for;
use crate::dates;
use crate::db::task_repo;
use crate::error::{ErrorCode, TasknestError};
use crate::models::Scope;

#[derive(Debug, Clone, Copy, Default)]
pub struct NewTask<'a> {
    pub title: &'a str,
    pub details: Option<&'a str>,
    /// Raw date input. Absent or unparseable falls back to today.
    pub due_date: Option<&'a str>,
}

/// Partial update: `None` keeps the stored value. An explicitly supplied
/// but unparseable due date is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskPatch<'a> {
    pub title: Option<&'a str>,
    pub details: Option<&'a str>,
    pub due_date: Option<&'a str>,
}

pub fn add_task(
    conn: &Connection,
    owner: &str,
    new: NewTask,
    scope: Scope,
) -> Result<TaskResponse, TasknestError> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(TasknestError::validation("task title is required"));
    }
    let today = Local::now().date_naive();
    let due_date = new
        .due_date
        .and_then(dates::parse_date_input)
        .unwrap_or(today);

    let id = ulid::Ulid::new().to_string();
    let task = task_repo::create_task(conn, &id, owner, title, new.details, due_date)?;
    let counts = counts_for(conn, owner, scope)?;
    Ok(TaskResponse {
        success: true,
        task,
        counts,
    })
}

pub fn update_task(
    conn: &Connection,
    owner: &str,
    task_id: &str,
    patch: TaskPatch,
    scope: Scope,
) -> Result<TaskResponse, TasknestError> {
    let current = task_repo::get_task(conn, owner, task_id)?;

    let title = patch.title.unwrap_or(&current.title);
    let details = match patch.details {
        Some(d) => Some(d),
        None => current.details.as_deref(),
    };
    let due_date = match patch.due_date {
        None => current.due_date,
        Some(raw) => dates::parse_date_input(raw).ok_or_else(|| {
            TasknestError::validation(format!("unparseable due date: {raw}"))
        })?,
    };

    let task = task_repo::update_task_fields(conn, owner, task_id, title, details, due_date)?;
    let counts = counts_for(conn, owner, scope)?;
    Ok(TaskResponse {
        success: true,
        task,
        counts,
    })
}

/// Move several tasks to one new due date. The date is validated before
/// any write, so an unparseable input rejects the whole batch.
pub fn update_task_dates(
    conn: &Connection,
    owner: &str,
    task_ids: &[String],
    due_date: Option<&str>,
    scope: Scope,
) -> Result<TaskBatchResponse, TasknestError> {
    if task_ids.is_empty() {
        return Err(TasknestError::validation("task_ids list is empty"));
    }
    let parsed = match due_date {
        None => None,
        Some(raw) => Some(dates::parse_date_input(raw).ok_or_else(|| {
            TasknestError::validation(format!("unparseable due date: {raw}"))
        })?),
    };

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<TaskBatchResponse, TasknestError> {
        let owned = task_repo::tasks_by_ids(conn, owner, task_ids)?;
        if owned.is_empty() {
            return Err(TasknestError::new(ErrorCode::TaskNotFound, "No tasks found"));
        }
        if let Some(date) = parsed {
            task_repo::bulk_update_due_date(conn, owner, task_ids, date)?;
        }
        let tasks = task_repo::tasks_by_ids(conn, owner, task_ids)?;
        let counts = counts_for(conn, owner, scope)?;
        Ok(TaskBatchResponse {
            success: true,
            tasks,
            counts,
        })
    })();

    match result {
        Ok(response) => {
            conn.execute_batch("COMMIT")?;
            Ok(response)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

pub fn delete_task(
    conn: &Connection,
    owner: &str,
    task_id: &str,
    scope: Scope,
) -> Result<DeleteResponse, TasknestError> {
    task_repo::delete_task(conn, owner, task_id)?;
    let counts = counts_for(conn, owner, scope)?;
    Ok(DeleteResponse {
        success: true,
        message: "Task deleted".to_string(),
        counts,
    })
}

/// Bulk delete. An empty id list is a client error; ids that match no
/// owned task simply delete nothing.
pub fn delete_tasks(
    conn: &Connection,
    owner: &str,
    task_ids: &[String],
    scope: Scope,
) -> Result<DeleteResponse, TasknestError> {
    if task_ids.is_empty() {
        return Err(TasknestError::validation("task_ids list is empty"));
    }
    task_repo::bulk_delete(conn, owner, task_ids)?;
    let counts = counts_for(conn, owner, scope)?;
    Ok(DeleteResponse {
        success: true,
        message: "Tasks deleted".to_string(),
        counts,
    })
}

pub fn toggle_complete(
    conn: &Connection,
    owner: &str,
    task_id: &str,
    scope: Scope,
) -> Result<TaskResponse, TasknestError> {
    let current = task_repo::get_task(conn, owner, task_id)?;
    let completed = !current.completed;
    let completed_on = completed.then(|| Local::now().date_naive());

    let task = task_repo::set_completion(conn, owner, task_id, completed, completed_on)?;
    let counts = counts_for(conn, owner, scope)?;
    Ok(TaskResponse {
        success: true,
        task,
        counts,
    })
}

/// Bulk toggle: each task flips from its own prior state; this is not a
/// "set all complete" operation.
pub fn toggle_tasks_complete(
    conn: &Connection,
    owner: &str,
    task_ids: &[String],
    scope: Scope,
) -> Result<TaskBatchResponse, TasknestError> {
    let today = Local::now().date_naive();

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<TaskBatchResponse, TasknestError> {
        task_repo::bulk_toggle(conn, owner, task_ids, today)?;
        let tasks = task_repo::tasks_by_ids(conn, owner, task_ids)?;
        let counts = counts_for(conn, owner, scope)?;
        Ok(TaskBatchResponse {
            success: true,
            tasks,
            counts,
        })
    })();

    match result {
        Ok(response) => {
            conn.execute_batch("COMMIT")?;
            Ok(response)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

//! Owner-scoped list views with pagination and summary counts.
//!
//! The today and upcoming views run the materialization engine first so
//! routine tasks exist before the query; the all view deliberately does
//! not (routine tasks outside the planning horizon appear only once a
//! qualifying call materializes them).

use chrono::{Local, NaiveDate};
use rusqlite::Connection;

use crate::api::response::{PageInfo, ScopeCounts, TaskListResponse, PER_PAGE};
use crate::db::task_repo;
use crate::engine;
use crate::error::TasknestError;
use crate::models::Scope;

/// Tasks due today plus overdue incomplete tasks from earlier dates.
pub fn today_tasks(
    conn: &Connection,
    owner: &str,
    page: Option<&str>,
) -> Result<TaskListResponse, TasknestError> {
    let today = Local::now().date_naive();
    engine::apply_routines(conn, owner, today)?;
    list_view(conn, owner, Scope::Today, today, page)
}

/// Tasks due within [today, today + 7 days] inclusive.
pub fn next_week_tasks(
    conn: &Connection,
    owner: &str,
    page: Option<&str>,
) -> Result<TaskListResponse, TasknestError> {
    let today = Local::now().date_naive();
    engine::apply_routines(conn, owner, today)?;
    list_view(conn, owner, Scope::Upcoming, today, page)
}

/// Every owned task, no date filter and no materialization pass.
pub fn all_tasks(
    conn: &Connection,
    owner: &str,
    page: Option<&str>,
) -> Result<TaskListResponse, TasknestError> {
    let today = Local::now().date_naive();
    list_view(conn, owner, Scope::All, today, page)
}

/// Counts for a caller-chosen scope, recomputed from the unpaginated
/// filtered set. Every mutation response carries these.
pub fn counts_for(
    conn: &Connection,
    owner: &str,
    scope: Scope,
) -> Result<ScopeCounts, TasknestError> {
    let today = Local::now().date_naive();
    let (total, completed) = task_repo::scope_counts(conn, owner, scope, today)?;
    Ok(ScopeCounts::new(total, completed))
}

fn list_view(
    conn: &Connection,
    owner: &str,
    scope: Scope,
    today: NaiveDate,
    page: Option<&str>,
) -> Result<TaskListResponse, TasknestError> {
    let (total, completed) = task_repo::scope_counts(conn, owner, scope, today)?;
    let num_pages = page_count(total);
    let page = resolve_page(page, num_pages);

    let tasks = task_repo::list_scope(conn, owner, scope, today, PER_PAGE, (page - 1) * PER_PAGE)?;

    Ok(TaskListResponse {
        success: true,
        owner: owner.to_string(),
        user_tasks: tasks,
        pagination: PageInfo {
            page,
            num_pages,
            per_page: PER_PAGE,
            total,
        },
        counts: ScopeCounts::new(total, completed),
    })
}

fn page_count(total: i64) -> i64 {
    ((total + PER_PAGE - 1) / PER_PAGE).max(1)
}

/// Non-numeric, zero, or beyond-last-page input falls back to page 1.
fn resolve_page(raw: Option<&str>, num_pages: i64) -> i64 {
    let requested = raw.and_then(|p| p.trim().parse::<i64>().ok()).unwrap_or(1);
    if requested < 1 || requested > num_pages {
        1
    } else {
        requested
    }
}

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{ErrorCode, TasknestError};
use crate::models::Task;

/// Fixed page size for every list view.
pub const PER_PAGE: i64 = 20;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Summary counts over the unpaginated filtered set of one scope.
/// `pending_tasks` is always derived, so `pending = total - completed`
/// holds by construction.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScopeCounts {
    pub total_number_tasks: i64,
    pub completed_tasks_count: i64,
    pub pending_tasks: i64,
}

impl ScopeCounts {
    pub fn new(total: i64, completed: i64) -> Self {
        Self {
            total_number_tasks: total,
            completed_tasks_count: completed,
            pending_tasks: total - completed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub owner: String,
    pub user_tasks: Vec<Task>,
    pub pagination: PageInfo,
    #[serde(flatten)]
    pub counts: ScopeCounts,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub task: Task,
    #[serde(flatten)]
    pub counts: ScopeCounts,
}

#[derive(Debug, Serialize)]
pub struct TaskBatchResponse {
    pub success: bool,
    pub tasks: Vec<Task>,
    #[serde(flatten)]
    pub counts: ScopeCounts,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub counts: ScopeCounts,
}

/// Boundary translator for errors. Internal failures are logged with full
/// detail here and cross the boundary as a generic message; validation and
/// not-found keep their descriptive text.
pub fn error_body(err: &TasknestError) -> Value {
    let message = match err.code {
        ErrorCode::DatabaseError => {
            log::error!("internal error: {}", err.message);
            "An error occurred".to_string()
        }
        _ => err.message.clone(),
    };
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": message,
        }
    })
}

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    TaskNotFound,
    RoutineNotFound,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::RoutineNotFound => "ROUTINE_NOT_FOUND",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }

    /// Status the boundary translator maps this code to. Ownership
    /// violations surface as 404, identical to a missing id.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::TaskNotFound | Self::RoutineNotFound => 404,
            Self::DatabaseError => 500,
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct TasknestError {
    pub code: ErrorCode,
    pub message: String,
}

impl TasknestError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn task_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {reference}"),
        )
    }

    pub fn routine_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::RoutineNotFound,
            format!("Routine not found: {reference}"),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl From<rusqlite::Error> for TasknestError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Query scope for list views and mutation-response counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Today,
    Upcoming,
    All,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Upcoming => "upcoming",
            Self::All => "all",
        }
    }

    /// Parse a caller-supplied scope name. Unknown input falls back to
    /// `All` rather than failing.
    pub fn from_param(s: &str) -> Self {
        match s {
            "today" => Self::Today,
            "upcoming" | "next_week" => Self::Upcoming,
            _ => Self::All,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub details: Option<String>,
    pub due_date: NaiveDate,
    pub completed: bool,
    pub completed_on: Option<NaiveDate>,
    /// Routine that materialized this task, if any. Tasks created directly
    /// by the user carry neither field.
    pub source_routine: Option<String>,
    pub materialized_for: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn is_materialized(&self) -> bool {
        self.source_routine.is_some()
    }
}

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Recurrence rule for a routine. The materialization engine treats every
/// variant as a pure predicate over calendar dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecurrenceRule {
    /// Fires on the listed weekdays.
    Weekdays { days: Vec<Weekday> },
    /// Fires every `interval` days starting at `anchor`. An interval of
    /// zero never fires.
    EveryNDays { anchor: NaiveDate, interval: u32 },
    /// Fires on the listed dates only.
    OnDates { dates: Vec<NaiveDate> },
}

impl RecurrenceRule {
    pub fn fires_on(&self, date: NaiveDate) -> bool {
        match self {
            Self::Weekdays { days } => days.contains(&date.weekday()),
            Self::EveryNDays { anchor, interval } => {
                if *interval == 0 || date < *anchor {
                    return false;
                }
                (date - *anchor).num_days() % i64::from(*interval) == 0
            }
            Self::OnDates { dates } => dates.contains(&date),
        }
    }
}

/// A recurring-task definition. `title`/`details` are the template copied
/// into each task the engine materializes; edits after materialization do
/// not flow back into existing tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routine {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub details: Option<String>,
    pub rule: RecurrenceRule,
    pub created_at: String,
}

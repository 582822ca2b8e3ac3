use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse lenient date input into a calendar date.
///
/// Accepts ISO-8601 dates (`2025-03-14`), RFC 3339 timestamps, and a few
/// common datetime spellings; the time component is dropped. Returns `None`
/// for anything else so callers choose between defaulting and rejecting.
pub fn parse_date_input(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
}

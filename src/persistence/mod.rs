//! Persistence layer modules.

use chrono::{DateTime, Utc};

use crate::{AppError, Result};

pub mod db;
pub mod invitation_repo;
pub mod lesson_repo;
pub mod resolution_repo;
pub mod retention;
pub mod schema;
pub mod submission_repo;
pub mod user_repo;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;

/// Parse an RFC3339 column into a UTC timestamp.
pub(crate) fn parse_ts(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

/// Parse an optional RFC3339 column.
pub(crate) fn parse_opt_ts(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|s| parse_ts(field, s)).transpose()
}

/// Parse a JSON string-array column.
pub(crate) fn parse_tags(field: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

/// Encode a tag list as a JSON string-array column.
pub(crate) fn tags_json(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).map_err(|e| AppError::Db(format!("failed to encode tags: {e}")))
}

//! Duplicate resolution journal for `SQLite` persistence.
//!
//! Insert-only: a row means the group has left the pending queue.

use std::collections::HashSet;
use std::sync::Arc;

use crate::models::resolution::{ResolutionKind, ResolutionRecord};
use crate::{AppError, Result};

use super::db::Database;
use super::parse_ts;

/// Repository wrapper around `SQLite` for resolution records.
#[derive(Clone)]
pub struct ResolutionRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct ResolutionRow {
    id: String,
    group_id: String,
    kind: String,
    reviewer_id: String,
    kept_count: i64,
    archived_count: i64,
    reason: Option<String>,
    created_at: String,
}

impl ResolutionRow {
    fn into_record(self) -> Result<ResolutionRecord> {
        let kind = ResolutionKind::parse(&self.kind)
            .ok_or_else(|| AppError::Db(format!("invalid resolution kind: {}", self.kind)))?;
        Ok(ResolutionRecord {
            id: self.id,
            group_id: self.group_id,
            kind,
            reviewer_id: self.reviewer_id,
            kept_count: u32::try_from(self.kept_count)
                .map_err(|e| AppError::Db(format!("invalid kept_count: {e}")))?,
            archived_count: u32::try_from(self.archived_count)
                .map_err(|e| AppError::Db(format!("invalid archived_count: {e}")))?,
            reason: self.reason,
            created_at: parse_ts("created_at", &self.created_at)?,
        })
    }
}

impl ResolutionRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a resolution record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails.
    pub async fn record(&self, record: &ResolutionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO duplicate_resolution (id, group_id, kind, reviewer_id, kept_count,
             archived_count, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&record.id)
        .bind(&record.group_id)
        .bind(record.kind.as_str())
        .bind(&record.reviewer_id)
        .bind(i64::from(record.kept_count))
        .bind(i64::from(record.archived_count))
        .bind(&record.reason)
        .bind(record.created_at.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;
        Ok(())
    }

    /// Identifiers of every group with at least one journal entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn resolved_group_ids(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT group_id FROM duplicate_resolution")
                .fetch_all(self.db.as_ref())
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Journal entries for one group, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_for_group(&self, group_id: &str) -> Result<Vec<ResolutionRecord>> {
        let rows: Vec<ResolutionRow> = sqlx::query_as(
            "SELECT * FROM duplicate_resolution WHERE group_id = ?1 ORDER BY created_at",
        )
        .bind(group_id)
        .fetch_all(self.db.as_ref())
        .await?;
        rows.into_iter().map(ResolutionRow::into_record).collect()
    }

    /// Every journal entry, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<ResolutionRecord>> {
        let rows: Vec<ResolutionRow> =
            sqlx::query_as("SELECT * FROM duplicate_resolution ORDER BY created_at")
                .fetch_all(self.db.as_ref())
                .await?;
        rows.into_iter().map(ResolutionRow::into_record).collect()
    }
}

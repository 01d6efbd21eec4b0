//! Submission repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::models::lesson::Lesson;
use crate::models::submission::{LessonMetadata, Submission, SubmissionStatus};
use crate::models::{Page, PageRequest};
use crate::{AppError, Result};

use super::db::Database;
use super::lesson_repo::insert_lesson;
use super::{parse_opt_ts, parse_tags, parse_ts, tags_json};

/// Repository wrapper around `SQLite` for submission records.
#[derive(Clone)]
pub struct SubmissionRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: String,
    title: String,
    summary: Option<String>,
    content_url: Option<String>,
    submitted_by: String,
    status: String,
    subjects: String,
    grade_levels: String,
    reviewer_notes: Option<String>,
    reviewed_by: Option<String>,
    reviewed_at: Option<String>,
    lesson_id: Option<String>,
    created_at: String,
}

impl SubmissionRow {
    fn into_submission(self) -> Result<Submission> {
        let status = SubmissionStatus::parse(&self.status)
            .ok_or_else(|| AppError::Db(format!("invalid submission status: {}", self.status)))?;

        Ok(Submission {
            id: self.id,
            title: self.title,
            summary: self.summary,
            content_url: self.content_url,
            submitted_by: self.submitted_by,
            status,
            subjects: parse_tags("subjects", &self.subjects)?,
            grade_levels: parse_tags("grade_levels", &self.grade_levels)?,
            reviewer_notes: self.reviewer_notes,
            reviewed_by: self.reviewed_by,
            reviewed_at: parse_opt_ts("reviewed_at", self.reviewed_at.as_deref())?,
            lesson_id: self.lesson_id,
            created_at: parse_ts("created_at", &self.created_at)?,
        })
    }
}

/// Decision fields written when a reviewer closes a submission.
#[derive(Debug, Clone)]
pub struct DecisionUpdate<'a> {
    /// New status.
    pub status: SubmissionStatus,
    /// Reviewer-applied tags.
    pub metadata: &'a LessonMetadata,
    /// Reviewer notes.
    pub notes: Option<&'a str>,
    /// Reviewer id.
    pub reviewed_by: &'a str,
    /// Decision time.
    pub reviewed_at: DateTime<Utc>,
}

impl SubmissionRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new submission record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails.
    pub async fn create(&self, submission: &Submission) -> Result<Submission> {
        sqlx::query(
            "INSERT INTO submission (id, title, summary, content_url, submitted_by, status,
             subjects, grade_levels, reviewer_notes, reviewed_by, reviewed_at, lesson_id,
             created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&submission.id)
        .bind(&submission.title)
        .bind(&submission.summary)
        .bind(&submission.content_url)
        .bind(&submission.submitted_by)
        .bind(submission.status.as_str())
        .bind(tags_json(&submission.subjects)?)
        .bind(tags_json(&submission.grade_levels)?)
        .bind(&submission.reviewer_notes)
        .bind(&submission.reviewed_by)
        .bind(submission.reviewed_at.map(|dt| dt.to_rfc3339()))
        .bind(&submission.lesson_id)
        .bind(submission.created_at.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;

        Ok(submission.clone())
    }

    /// Retrieve a submission by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Submission>> {
        let row: Option<SubmissionRow> = sqlx::query_as("SELECT * FROM submission WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(SubmissionRow::into_submission).transpose()
    }

    /// List one page of submissions, oldest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if either query fails.
    pub async fn list(
        &self,
        status: Option<SubmissionStatus>,
        page: PageRequest,
    ) -> Result<Page<Submission>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM submission");
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM submission");
        if let Some(status) = status {
            count_qb.push(" WHERE status = ").push_bind(status.as_str());
            qb.push(" WHERE status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY created_at ASC, id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.db.as_ref())
            .await?;
        let rows: Vec<SubmissionRow> = qb.build_query_as().fetch_all(self.db.as_ref()).await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(SubmissionRow::into_submission)
                .collect::<Result<_>>()?,
            total: u64::try_from(total).unwrap_or_default(),
            page: page.page,
            per_page: page.per_page,
        })
    }

    /// Status of every submission.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_statuses(&self) -> Result<Vec<SubmissionStatus>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT status FROM submission")
            .fetch_all(self.db.as_ref())
            .await?;
        rows.into_iter()
            .map(|(s,)| {
                SubmissionStatus::parse(&s)
                    .ok_or_else(|| AppError::Db(format!("invalid submission status: {s}")))
            })
            .collect()
    }

    /// Record a reject or needs-revision decision.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if the submission is no longer open for
    /// review, or `AppError::Db` if the update fails.
    pub async fn record_decision(&self, id: &str, decision: &DecisionUpdate<'_>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE submission SET status = ?1, title = ?2, summary = ?3, subjects = ?4,
             grade_levels = ?5, reviewer_notes = ?6, reviewed_by = ?7, reviewed_at = ?8
             WHERE id = ?9 AND status IN ('pending', 'needs_revision')",
        )
        .bind(decision.status.as_str())
        .bind(&decision.metadata.title)
        .bind(&decision.metadata.summary)
        .bind(tags_json(&decision.metadata.subjects)?)
        .bind(tags_json(&decision.metadata.grade_levels)?)
        .bind(decision.notes)
        .bind(decision.reviewed_by)
        .bind(decision.reviewed_at.to_rfc3339())
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(already_decided(id));
        }
        Ok(())
    }

    /// Promote a submission: insert the lesson and mark the submission
    /// approved in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if the submission is no longer open for
    /// review, or `AppError::Db` if either write fails. Nothing is committed
    /// on error.
    pub async fn approve_with_lesson(
        &self,
        id: &str,
        decision: &DecisionUpdate<'_>,
        lesson: &Lesson,
    ) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            "UPDATE submission SET status = 'approved', title = ?1, summary = ?2,
             subjects = ?3, grade_levels = ?4, reviewer_notes = ?5, reviewed_by = ?6,
             reviewed_at = ?7, lesson_id = ?8
             WHERE id = ?9 AND status IN ('pending', 'needs_revision')",
        )
        .bind(&decision.metadata.title)
        .bind(&decision.metadata.summary)
        .bind(tags_json(&decision.metadata.subjects)?)
        .bind(tags_json(&decision.metadata.grade_levels)?)
        .bind(decision.notes)
        .bind(decision.reviewed_by)
        .bind(decision.reviewed_at.to_rfc3339())
        .bind(&lesson.id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(already_decided(id));
        }

        insert_lesson(&mut *tx, lesson).await?;
        tx.commit().await?;
        Ok(())
    }
}

fn already_decided(id: &str) -> AppError {
    AppError::Conflict(format!("submission {id} was already decided"))
}

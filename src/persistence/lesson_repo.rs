//! Lesson repository for `SQLite` persistence.

use std::sync::Arc;

use sqlx::SqliteConnection;

use crate::models::lesson::Lesson;
use crate::Result;

use super::db::Database;
use super::{parse_tags, parse_ts, tags_json};

/// Repository wrapper around `SQLite` for lesson records.
#[derive(Clone)]
pub struct LessonRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct LessonRow {
    id: String,
    title: String,
    summary: Option<String>,
    subjects: String,
    grade_levels: String,
    source_submission_id: Option<String>,
    created_at: String,
}

impl LessonRow {
    fn into_lesson(self) -> Result<Lesson> {
        Ok(Lesson {
            id: self.id,
            title: self.title,
            summary: self.summary,
            subjects: parse_tags("subjects", &self.subjects)?,
            grade_levels: parse_tags("grade_levels", &self.grade_levels)?,
            source_submission_id: self.source_submission_id,
            created_at: parse_ts("created_at", &self.created_at)?,
        })
    }
}

/// Insert a lesson on an existing connection or transaction.
pub(crate) async fn insert_lesson(conn: &mut SqliteConnection, lesson: &Lesson) -> Result<()> {
    sqlx::query(
        "INSERT INTO lesson (id, title, summary, subjects, grade_levels,
         source_submission_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&lesson.id)
    .bind(&lesson.title)
    .bind(&lesson.summary)
    .bind(tags_json(&lesson.subjects)?)
    .bind(tags_json(&lesson.grade_levels)?)
    .bind(&lesson.source_submission_id)
    .bind(lesson.created_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

impl LessonRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new lesson record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails.
    pub async fn create(&self, lesson: &Lesson) -> Result<Lesson> {
        let mut conn = self.db.acquire().await?;
        insert_lesson(&mut conn, lesson).await?;
        Ok(lesson.clone())
    }

    /// Retrieve a lesson by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Lesson>> {
        let row: Option<LessonRow> = sqlx::query_as("SELECT * FROM lesson WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(LessonRow::into_lesson).transpose()
    }

    /// Total number of lessons.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lesson")
            .fetch_one(self.db.as_ref())
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

//! Published lesson model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::submission::LessonMetadata;

/// A lesson in the library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Lesson {
    /// Unique record identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Short description.
    pub summary: Option<String>,
    /// Subject tags.
    pub subjects: Vec<String>,
    /// Grade-level tags.
    pub grade_levels: Vec<String>,
    /// Submission this lesson was promoted from.
    pub source_submission_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Lesson {
    /// Build a lesson from reviewer metadata.
    #[must_use]
    pub fn from_metadata(metadata: LessonMetadata, source_submission_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: metadata.title,
            summary: metadata.summary,
            subjects: metadata.subjects,
            grade_levels: metadata.grade_levels,
            source_submission_id,
            created_at: Utc::now(),
        }
    }
}

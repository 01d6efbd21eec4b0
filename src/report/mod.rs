//! Precomputed duplicate-analysis report.
//!
//! The report is produced offline. One schema is accepted, identified by
//! `schema_version`; anything else is rejected rather than guessed at.
//!
//! ```json
//! {
//!   "schema_version": 3,
//!   "generated_at": "2026-10-01T04:00:00Z",
//!   "groups": [
//!     {
//!       "group_id": "g-001",
//!       "detection_method": "same_title",
//!       "similarity": 0.97,
//!       "lessons": [
//!         { "lesson_id": "L1", "title": "Fractions", "recommended_canonical": true },
//!         { "lesson_id": "L2", "title": "Fractions", "similarity": 0.97 }
//!       ]
//!     }
//!   ]
//! }
//! ```

pub mod source;

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::models::duplicate::{DetectionMethod, DuplicateGroup, LessonSummary};
use crate::{AppError, Result};

pub use source::ReportGroupSource;

/// The only report schema version this build understands.
pub const SUPPORTED_SCHEMA_VERSION: u32 = 3;

/// Parsed report.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateReport {
    /// When the offline analysis ran.
    pub generated_at: DateTime<Utc>,
    /// Groups in report order.
    pub groups: Vec<DuplicateGroup>,
}

#[derive(Debug, Deserialize)]
struct VersionHeader {
    schema_version: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReport {
    #[allow(dead_code)]
    schema_version: u32,
    generated_at: DateTime<Utc>,
    groups: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    group_id: String,
    detection_method: DetectionMethod,
    #[serde(default)]
    similarity: Option<f64>,
    lessons: Vec<RawLesson>,
}

#[derive(Debug, Deserialize)]
struct RawLesson {
    lesson_id: String,
    title: String,
    #[serde(default)]
    recommended_canonical: bool,
    #[serde(default)]
    similarity: Option<f64>,
}

impl DuplicateReport {
    /// Parse report JSON.
    ///
    /// Groups with fewer than two lessons are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Report` for malformed JSON, an unsupported
    /// `schema_version`, empty identifiers, duplicate group ids, or a lesson
    /// listed twice within a group.
    pub fn from_json(raw: &str) -> Result<Self> {
        let header: VersionHeader = serde_json::from_str(raw)?;
        if header.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(AppError::Report(format!(
                "unsupported schema_version {} (expected {SUPPORTED_SCHEMA_VERSION})",
                header.schema_version
            )));
        }

        let report: RawReport = serde_json::from_str(raw)?;
        let mut seen = HashSet::new();
        let mut groups = Vec::with_capacity(report.groups.len());

        for group in report.groups {
            if group.group_id.trim().is_empty() {
                return Err(AppError::Report("group with empty group_id".into()));
            }
            if !seen.insert(group.group_id.clone()) {
                return Err(AppError::Report(format!(
                    "duplicate group_id {}",
                    group.group_id
                )));
            }
            if group.lessons.iter().any(|l| l.lesson_id.trim().is_empty()) {
                return Err(AppError::Report(format!(
                    "group {} has a lesson with empty lesson_id",
                    group.group_id
                )));
            }
            if let Some(repeated) = repeated_lesson(&group.lessons) {
                return Err(AppError::Report(format!(
                    "group {} lists lesson {repeated} more than once",
                    group.group_id
                )));
            }
            if group.lessons.len() < 2 {
                warn!(group_id = %group.group_id, "skipping group with fewer than two lessons");
                continue;
            }

            groups.push(DuplicateGroup {
                group_id: group.group_id,
                detection_method: group.detection_method,
                similarity: group.similarity,
                lessons: group
                    .lessons
                    .into_iter()
                    .map(|l| LessonSummary {
                        id: l.lesson_id,
                        title: l.title,
                        recommended_canonical: l.recommended_canonical,
                        similarity: l.similarity,
                    })
                    .collect(),
            });
        }

        Ok(Self {
            generated_at: report.generated_at,
            groups,
        })
    }

    /// Read and parse a report file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Report` if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
            AppError::Report(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_json(&raw)
    }
}

fn repeated_lesson(lessons: &[RawLesson]) -> Option<&str> {
    let mut seen = HashSet::new();
    lessons
        .iter()
        .map(|l| l.lesson_id.as_str())
        .find(|id| !seen.insert(*id))
}

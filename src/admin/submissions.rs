//! Lesson submission review.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::models::lesson::Lesson;
use crate::models::submission::{
    LessonMetadata, ReviewDecision, Submission, SubmissionReview, SubmissionStatus,
};
use crate::models::{Page, PageRequest};
use crate::persistence::submission_repo::{DecisionUpdate, SubmissionRepo};
use crate::{AppError, Result};

/// Query string accepted by the submission list.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SubmissionQuery {
    /// Status filter.
    pub status: Option<SubmissionStatus>,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// One page of submissions, oldest first.
///
/// # Errors
///
/// Returns `AppError::Db` if the query fails.
pub async fn list_submissions(
    repo: &SubmissionRepo,
    query: &SubmissionQuery,
) -> Result<Page<Submission>> {
    repo.list(query.status, PageRequest::new(query.page, query.per_page))
        .await
}

/// A single submission.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the submission does not exist.
pub async fn get_submission(repo: &SubmissionRepo, id: &str) -> Result<Submission> {
    repo.get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("submission {id}")))
}

/// Apply a review decision.
///
/// Approval inserts a lesson built from the reviewed metadata and links it
/// to the submission in one transaction.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown submission,
/// `AppError::Conflict` when it was already decided, and
/// `AppError::Validation` when the form is incomplete for the decision.
pub async fn review_submission(
    repo: &SubmissionRepo,
    id: &str,
    review: SubmissionReview,
    reviewer_id: &str,
) -> Result<Submission> {
    let submission = get_submission(repo, id).await?;
    if !submission.status.is_reviewable() {
        return Err(AppError::Conflict(format!(
            "submission {id} is already {}",
            submission.status.as_str()
        )));
    }

    let metadata = normalize(review.metadata);
    let notes = review
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    validate(review.decision, &metadata, notes)?;

    let update = DecisionUpdate {
        status: review.decision.resulting_status(),
        metadata: &metadata,
        notes,
        reviewed_by: reviewer_id,
        reviewed_at: Utc::now(),
    };

    if review.decision == ReviewDecision::Approve {
        let lesson = Lesson::from_metadata(metadata.clone(), Some(id.to_owned()));
        repo.approve_with_lesson(id, &update, &lesson).await?;
        info!(submission_id = id, lesson_id = %lesson.id, "submission approved");
    } else {
        repo.record_decision(id, &update).await?;
        info!(submission_id = id, status = update.status.as_str(), "submission reviewed");
    }

    get_submission(repo, id).await
}

fn validate(
    decision: ReviewDecision,
    metadata: &LessonMetadata,
    notes: Option<&str>,
) -> Result<()> {
    match decision {
        ReviewDecision::Approve => {
            if metadata.title.is_empty() {
                return Err(AppError::Validation("an approved lesson needs a title".into()));
            }
            if metadata.grade_levels.is_empty() {
                return Err(AppError::Validation(
                    "an approved lesson needs at least one grade level".into(),
                ));
            }
        }
        ReviewDecision::Reject | ReviewDecision::NeedsRevision => {
            if notes.is_none() {
                return Err(AppError::Validation(
                    "notes are required when rejecting or requesting revisions".into(),
                ));
            }
        }
    }
    Ok(())
}

fn normalize(metadata: LessonMetadata) -> LessonMetadata {
    fn tags(values: Vec<String>) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(values.len());
        for value in values {
            let value = value.trim().to_owned();
            if !value.is_empty() && !out.contains(&value) {
                out.push(value);
            }
        }
        out
    }

    LessonMetadata {
        title: metadata.title.trim().to_owned(),
        summary: metadata
            .summary
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty()),
        subjects: tags(metadata.subjects),
        grade_levels: tags(metadata.grade_levels),
    }
}

//! Integration tests for submission review.
//!
//! Validates approve, reject, and needs-revision decisions, including the
//! transactional lesson insert on approval.

use std::sync::Arc;

use chrono::Utc;

use lesson_admin::admin::submissions::{
    get_submission, list_submissions, review_submission, SubmissionQuery,
};
use lesson_admin::models::submission::{
    LessonMetadata, ReviewDecision, Submission, SubmissionReview, SubmissionStatus,
};
use lesson_admin::persistence::db;
use lesson_admin::persistence::lesson_repo::LessonRepo;
use lesson_admin::persistence::submission_repo::{DecisionUpdate, SubmissionRepo};
use lesson_admin::AppError;

async fn repos() -> (SubmissionRepo, LessonRepo) {
    let db = Arc::new(db::connect_memory().await.expect("db connect"));
    (SubmissionRepo::new(Arc::clone(&db)), LessonRepo::new(db))
}

async fn submit(repo: &SubmissionRepo, title: &str) -> Submission {
    let submission = Submission::new(
        title.to_owned(),
        Some("Hands-on activity".into()),
        Some("https://docs.example.org/lesson".into()),
        "teacher-1".into(),
    );
    repo.create(&submission).await.expect("create submission")
}

fn review(decision: ReviewDecision, grades: &[&str], notes: Option<&str>) -> SubmissionReview {
    SubmissionReview {
        metadata: LessonMetadata {
            title: "  Fractions with Pizza ".into(),
            summary: Some(" ".into()),
            subjects: vec!["math".into(), " math ".into(), String::new()],
            grade_levels: grades.iter().map(|g| (*g).to_owned()).collect(),
        },
        decision,
        notes: notes.map(str::to_owned),
    }
}

#[tokio::test]
async fn approve_creates_lesson_and_links_it() {
    let (repo, lessons) = repos().await;
    let submission = submit(&repo, "fractions").await;

    let reviewed = review_submission(
        &repo,
        &submission.id,
        review(ReviewDecision::Approve, &["3", "4"], None),
        "reviewer-1",
    )
    .await
    .expect("approve");

    assert_eq!(reviewed.status, SubmissionStatus::Approved);
    assert_eq!(reviewed.title, "Fractions with Pizza");
    assert_eq!(reviewed.subjects, ["math"]);
    assert_eq!(reviewed.reviewed_by.as_deref(), Some("reviewer-1"));
    assert!(reviewed.reviewed_at.is_some());

    let lesson_id = reviewed.lesson_id.expect("lesson linked");
    let lesson = lessons.get_by_id(&lesson_id).await.expect("get").expect("lesson");
    assert_eq!(lesson.title, "Fractions with Pizza");
    assert_eq!(lesson.grade_levels, ["3", "4"]);
    assert!(lesson.summary.is_none());
    assert_eq!(lesson.source_submission_id.as_deref(), Some(submission.id.as_str()));
    assert_eq!(lessons.count().await.expect("count"), 1);
}

#[tokio::test]
async fn approve_without_grade_levels_is_rejected() {
    let (repo, lessons) = repos().await;
    let submission = submit(&repo, "fractions").await;

    let err = review_submission(
        &repo,
        &submission.id,
        review(ReviewDecision::Approve, &[" "], None),
        "reviewer-1",
    )
    .await
    .expect_err("missing grades");
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(lessons.count().await.expect("count"), 0);

    let unchanged = get_submission(&repo, &submission.id).await.expect("get");
    assert_eq!(unchanged.status, SubmissionStatus::Pending);
}

#[tokio::test]
async fn reject_requires_notes() {
    let (repo, _) = repos().await;
    let submission = submit(&repo, "fractions").await;

    let err = review_submission(
        &repo,
        &submission.id,
        review(ReviewDecision::Reject, &[], Some("   ")),
        "reviewer-1",
    )
    .await
    .expect_err("missing notes");
    assert!(matches!(err, AppError::Validation(_)));

    let rejected = review_submission(
        &repo,
        &submission.id,
        review(ReviewDecision::Reject, &[], Some("Duplicate of an existing lesson")),
        "reviewer-1",
    )
    .await
    .expect("reject");
    assert_eq!(rejected.status, SubmissionStatus::Rejected);
    assert_eq!(
        rejected.reviewer_notes.as_deref(),
        Some("Duplicate of an existing lesson")
    );
    assert!(rejected.lesson_id.is_none());
}

#[tokio::test]
async fn needs_revision_can_be_reviewed_again() {
    let (repo, _) = repos().await;
    let submission = submit(&repo, "fractions").await;

    let revised = review_submission(
        &repo,
        &submission.id,
        review(ReviewDecision::NeedsRevision, &[], Some("Add a worksheet")),
        "reviewer-1",
    )
    .await
    .expect("needs revision");
    assert_eq!(revised.status, SubmissionStatus::NeedsRevision);

    let approved = review_submission(
        &repo,
        &submission.id,
        review(ReviewDecision::Approve, &["5"], None),
        "reviewer-2",
    )
    .await
    .expect("approve after revision");
    assert_eq!(approved.status, SubmissionStatus::Approved);
}

#[tokio::test]
async fn decided_submission_cannot_be_reviewed_again() {
    let (repo, _) = repos().await;
    let submission = submit(&repo, "fractions").await;
    review_submission(
        &repo,
        &submission.id,
        review(ReviewDecision::Approve, &["3"], None),
        "reviewer-1",
    )
    .await
    .expect("approve");

    let err = review_submission(
        &repo,
        &submission.id,
        review(ReviewDecision::Reject, &[], Some("changed my mind")),
        "reviewer-1",
    )
    .await
    .expect_err("already approved");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn concurrent_approvals_create_one_lesson() {
    let (repo, lessons) = repos().await;
    let submission = submit(&repo, "fractions").await;

    let (first, second) = tokio::join!(
        review_submission(
            &repo,
            &submission.id,
            review(ReviewDecision::Approve, &["3"], None),
            "reviewer-1",
        ),
        review_submission(
            &repo,
            &submission.id,
            review(ReviewDecision::Approve, &["3"], None),
            "reviewer-2",
        ),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppError::Conflict(_)))));
    assert_eq!(lessons.count().await.expect("count"), 1);
}

#[tokio::test]
async fn store_refuses_decision_on_approved_submission() {
    let (repo, _lessons) = repos().await;
    let submission = submit(&repo, "fractions").await;
    review_submission(
        &repo,
        &submission.id,
        review(ReviewDecision::Approve, &["3"], None),
        "reviewer-1",
    )
    .await
    .expect("approve");

    let metadata = LessonMetadata::default();
    let err = repo
        .record_decision(
            &submission.id,
            &DecisionUpdate {
                status: SubmissionStatus::Rejected,
                metadata: &metadata,
                notes: Some("duplicate"),
                reviewed_by: "reviewer-2",
                reviewed_at: Utc::now(),
            },
        )
        .await
        .expect_err("already approved");
    assert!(matches!(err, AppError::Conflict(_)));

    let stored = get_submission(&repo, &submission.id).await.expect("get");
    assert_eq!(stored.status, SubmissionStatus::Approved);
    assert_eq!(stored.reviewed_by.as_deref(), Some("reviewer-1"));
}

#[tokio::test]
async fn unknown_submission_is_not_found() {
    let (repo, _) = repos().await;

    let err = review_submission(
        &repo,
        "missing",
        review(ReviewDecision::Approve, &["3"], None),
        "reviewer-1",
    )
    .await
    .expect_err("unknown");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn list_filters_by_status_and_paginates() {
    let (repo, _) = repos().await;
    let first = submit(&repo, "one").await;
    submit(&repo, "two").await;
    submit(&repo, "three").await;
    review_submission(
        &repo,
        &first.id,
        review(ReviewDecision::Reject, &[], Some("off topic")),
        "reviewer-1",
    )
    .await
    .expect("reject");

    let pending = list_submissions(
        &repo,
        &SubmissionQuery {
            status: Some(SubmissionStatus::Pending),
            page: Some(1),
            per_page: Some(1),
        },
    )
    .await
    .expect("list");
    assert_eq!(pending.total, 2);
    assert_eq!(pending.items.len(), 1);
    assert_eq!(pending.per_page, 1);
}

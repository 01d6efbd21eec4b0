//! Lesson submission model and review decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status for a submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Awaiting review.
    Pending,
    /// Promoted to a lesson.
    Approved,
    /// Declined.
    Rejected,
    /// Sent back to the author for changes.
    NeedsRevision,
}

impl SubmissionStatus {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::NeedsRevision => "needs_revision",
        }
    }

    /// Parse the storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "needs_revision" => Some(Self::NeedsRevision),
            _ => None,
        }
    }

    /// Whether a reviewer may still decide on a submission in this status.
    #[must_use]
    pub fn is_reviewable(self) -> bool {
        matches!(self, Self::Pending | Self::NeedsRevision)
    }
}

/// Reviewer decision on a submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Promote to a lesson.
    Approve,
    /// Decline.
    Reject,
    /// Return to the author.
    NeedsRevision,
}

impl ReviewDecision {
    /// Status the submission moves to.
    #[must_use]
    pub fn resulting_status(self) -> SubmissionStatus {
        match self {
            Self::Approve => SubmissionStatus::Approved,
            Self::Reject => SubmissionStatus::Rejected,
            Self::NeedsRevision => SubmissionStatus::NeedsRevision,
        }
    }
}

/// Metadata tags applied by the reviewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LessonMetadata {
    /// Final lesson title.
    pub title: String,
    /// Short description.
    #[serde(default)]
    pub summary: Option<String>,
    /// Subject tags.
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Grade-level tags.
    #[serde(default)]
    pub grade_levels: Vec<String>,
}

/// A review form posted for a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SubmissionReview {
    /// Metadata tags.
    pub metadata: LessonMetadata,
    /// Decision.
    pub decision: ReviewDecision,
    /// Reviewer notes; required for reject and needs-revision.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A lesson proposed by a teacher, awaiting review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Submission {
    /// Unique record identifier.
    pub id: String,
    /// Proposed title.
    pub title: String,
    /// Proposed summary.
    pub summary: Option<String>,
    /// Link to the lesson content.
    pub content_url: Option<String>,
    /// Submitting user.
    pub submitted_by: String,
    /// Current lifecycle status.
    pub status: SubmissionStatus,
    /// Subject tags.
    pub subjects: Vec<String>,
    /// Grade-level tags.
    pub grade_levels: Vec<String>,
    /// Reviewer notes from the latest decision.
    pub reviewer_notes: Option<String>,
    /// Reviewer of the latest decision.
    pub reviewed_by: Option<String>,
    /// Timestamp of the latest decision.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Lesson created on approval.
    pub lesson_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Construct a new pending submission.
    #[must_use]
    pub fn new(
        title: String,
        summary: Option<String>,
        content_url: Option<String>,
        submitted_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            summary,
            content_url,
            submitted_by,
            status: SubmissionStatus::Pending,
            subjects: Vec::new(),
            grade_levels: Vec::new(),
            reviewer_notes: None,
            reviewed_by: None,
            reviewed_at: None,
            lesson_id: None,
            created_at: Utc::now(),
        }
    }
}

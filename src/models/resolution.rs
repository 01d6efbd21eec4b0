//! Journal entry recorded after a duplicate group leaves the pending queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the group was closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// Lessons were merged: some kept, others archived.
    Resolved,
    /// Reviewer decided the lessons are not duplicates.
    Dismissed,
}

impl ResolutionKind {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    /// Parse the storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "resolved" => Some(Self::Resolved),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }
}

/// A closed duplicate group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ResolutionRecord {
    /// Unique record identifier.
    pub id: String,
    /// Group that was closed.
    pub group_id: String,
    /// Resolution or dismissal.
    pub kind: ResolutionKind,
    /// Reviewer who closed the group.
    pub reviewer_id: String,
    /// Lessons kept.
    pub kept_count: u32,
    /// Lessons archived.
    pub archived_count: u32,
    /// Dismissal reason.
    pub reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ResolutionRecord {
    /// Construct a new journal entry stamped now.
    #[must_use]
    pub fn new(
        group_id: String,
        kind: ResolutionKind,
        reviewer_id: String,
        kept_count: u32,
        archived_count: u32,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            group_id,
            kind,
            reviewer_id,
            kept_count,
            archived_count,
            reason,
            created_at: Utc::now(),
        }
    }
}

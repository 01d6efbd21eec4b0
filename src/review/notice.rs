//! Confirmation shown on the queue list after a group is closed.

use serde::Serialize;

use crate::models::resolution::ResolutionKind;

/// Summary of a successful resolve or dismiss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionNotice {
    /// Group that was closed.
    pub group_id: String,
    /// Resolution or dismissal.
    pub kind: ResolutionKind,
    /// Lessons kept.
    pub kept_count: u32,
    /// Lessons archived.
    pub archived_count: u32,
    /// Human-readable summary.
    pub message: String,
}

impl ResolutionNotice {
    /// Notice for a merge reported by the platform.
    #[must_use]
    pub fn resolved(group_id: &str, kept_count: u32, archived_count: u32) -> Self {
        Self {
            group_id: group_id.to_owned(),
            kind: ResolutionKind::Resolved,
            kept_count,
            archived_count,
            message: format!(
                "Group resolved: kept {kept_count}, archived {archived_count}"
            ),
        }
    }

    /// Notice for a dismissal of `lesson_count` lessons.
    #[must_use]
    pub fn dismissed(group_id: &str, lesson_count: u32) -> Self {
        Self {
            group_id: group_id.to_owned(),
            kind: ResolutionKind::Dismissed,
            kept_count: lesson_count,
            archived_count: 0,
            message: format!("Group dismissed: {lesson_count} lessons kept as distinct"),
        }
    }
}

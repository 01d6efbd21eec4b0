//! Duplicate-lesson groups, per-lesson selections, and remote resolution payloads.

use serde::{Deserialize, Serialize};

/// How the offline analysis detected a duplicate group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Lessons share a normalized title.
    SameTitle,
    /// Lessons are close in embedding space.
    Embedding,
    /// Both signals contributed to the group.
    Mixed,
}

/// Detection method vocabulary accepted by the remote dismiss procedure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DismissMethod {
    /// Dismissing a same-title group.
    SameTitle,
    /// Dismissing an embedding group.
    Embedding,
    /// Dismissing a group found by both signals.
    Both,
}

impl From<DetectionMethod> for DismissMethod {
    fn from(method: DetectionMethod) -> Self {
        match method {
            DetectionMethod::SameTitle => Self::SameTitle,
            DetectionMethod::Embedding => Self::Embedding,
            DetectionMethod::Mixed => Self::Both,
        }
    }
}

/// One lesson inside a duplicate group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct LessonSummary {
    /// Lesson identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Whether the report recommends this lesson as the canonical copy.
    #[serde(default)]
    pub recommended_canonical: bool,
    /// Similarity to the recommended canonical lesson, when reported.
    #[serde(default)]
    pub similarity: Option<f64>,
}

/// A group of lessons the offline analysis believes to be duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct DuplicateGroup {
    /// Opaque identifier, stable across loads.
    pub group_id: String,
    /// Lessons in report order.
    pub lessons: Vec<LessonSummary>,
    /// Detection signal that produced the group.
    pub detection_method: DetectionMethod,
    /// Group-level similarity score, when reported.
    #[serde(default)]
    pub similarity: Option<f64>,
}

impl DuplicateGroup {
    /// Lesson identifiers in group order.
    #[must_use]
    pub fn lesson_ids(&self) -> Vec<String> {
        self.lessons.iter().map(|l| l.id.clone()).collect()
    }

    /// Whether the group contains a lesson with the given id.
    #[must_use]
    pub fn contains(&self, lesson_id: &str) -> bool {
        self.lessons.iter().any(|l| l.id == lesson_id)
    }

    /// The lesson the report recommends keeping, if any.
    #[must_use]
    pub fn recommended(&self) -> Option<&LessonSummary> {
        self.lessons.iter().find(|l| l.recommended_canonical)
    }
}

/// Reviewer's choice for a single lesson.
///
/// `archive_to` may be empty while the reviewer is still editing; the
/// selection set is only submittable once every archive has a target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Selection {
    /// Keep the lesson.
    Keep,
    /// Archive the lesson into another kept lesson.
    Archive {
        /// Lesson that absorbs this one.
        #[serde(default)]
        archive_to: Option<String>,
    },
}

impl Selection {
    /// Archive into `target`.
    #[must_use]
    pub fn archive_to(target: impl Into<String>) -> Self {
        Self::Archive {
            archive_to: Some(target.into()),
        }
    }

    /// Whether this selection keeps the lesson.
    #[must_use]
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Archive target, if any and non-empty.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Keep => None,
            Self::Archive { archive_to } => archive_to.as_deref().filter(|t| !t.is_empty()),
        }
    }
}

/// Action sent to the remote resolve procedure for one lesson.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAction {
    /// Lesson stays live.
    Keep,
    /// Lesson is archived into `archive_to`.
    Archive,
}

/// One `(lesson_id, action, archive_to?)` tuple of a resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LessonResolution {
    /// Lesson identifier.
    pub lesson_id: String,
    /// Keep or archive.
    pub action: ResolutionAction,
    /// Absorbing lesson for archives.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub archive_to: Option<String>,
}

/// Arguments for the remote resolve procedure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ResolveRequest {
    /// Group being resolved.
    pub group_id: String,
    /// Every lesson's final disposition.
    pub resolutions: Vec<LessonResolution>,
}

/// Result of the remote resolve procedure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ResolveOutcome {
    /// Whether the procedure committed.
    pub success: bool,
    /// Lessons kept.
    #[serde(default)]
    pub kept_count: u32,
    /// Lessons archived.
    #[serde(default)]
    pub archived_count: u32,
    /// Server-provided rejection message.
    #[serde(default)]
    pub error: Option<String>,
}

/// Arguments for the remote dismiss procedure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DismissRequest {
    /// Every lesson in the group.
    pub lesson_ids: Vec<String>,
    /// Mapped detection method.
    pub detection_method: DismissMethod,
    /// Reason recorded with the dismissal.
    pub reason: String,
}

/// Result of the remote dismiss procedure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DismissOutcome {
    /// Whether the procedure committed.
    pub success: bool,
    /// Server-provided rejection message.
    #[serde(default)]
    pub error: Option<String>,
}

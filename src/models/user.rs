//! User profile model, roles, and permissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role assigned to a user account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Reviews submissions and duplicate groups.
    Reviewer,
    /// Contributes lessons; no admin access.
    Teacher,
}

/// Capability checked by the admin surface before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// List, edit, activate, deactivate, delete users.
    ManageUsers,
    /// Create, resend, revoke invitations.
    ManageInvitations,
    /// Tag and decide on lesson submissions.
    ReviewSubmissions,
    /// Resolve or dismiss duplicate groups.
    ReviewDuplicates,
    /// Read analytics dashboards.
    ViewAnalytics,
}

impl Role {
    /// Whether this role grants `permission`.
    #[must_use]
    pub fn permits(self, permission: Permission) -> bool {
        match self {
            Self::Admin => true,
            Self::Reviewer => matches!(
                permission,
                Permission::ReviewSubmissions
                    | Permission::ReviewDuplicates
                    | Permission::ViewAnalytics
            ),
            Self::Teacher => false,
        }
    }

    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Reviewer => "reviewer",
            Self::Teacher => "teacher",
        }
    }

    /// Parse the storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "reviewer" => Some(Self::Reviewer),
            "teacher" => Some(Self::Teacher),
            _ => None,
        }
    }
}

/// A user account's profile row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct UserProfile {
    /// Unique record identifier.
    pub id: String,
    /// Name shown in the admin lists.
    pub display_name: String,
    /// Assigned role.
    pub role: Role,
    /// School the user belongs to.
    pub school_id: Option<String>,
    /// Whether the account may sign in.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Most recent sign-in.
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Construct a new active user.
    #[must_use]
    pub fn new(display_name: String, role: Role, school_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name,
            role,
            school_id,
            is_active: true,
            created_at: Utc::now(),
            last_sign_in_at: None,
        }
    }
}

/// A school that users can belong to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct School {
    /// Unique record identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

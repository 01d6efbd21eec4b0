//! Invitation model for onboarding new accounts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Role;

/// Lifecycle status for an invitation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Sent and awaiting acceptance.
    Pending,
    /// Accepted; an account exists.
    Accepted,
    /// Withdrawn by an admin.
    Revoked,
    /// Not accepted before `expires_at`.
    Expired,
}

impl InvitationStatus {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }

    /// Parse the storage representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "revoked" => Some(Self::Revoked),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// An invitation to create an account with a preassigned role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Invitation {
    /// Unique record identifier.
    pub id: String,
    /// Invitee address, lowercased.
    pub email: String,
    /// Role granted on acceptance.
    pub role: Role,
    /// School granted on acceptance.
    pub school_id: Option<String>,
    /// Admin who sent the invitation.
    pub invited_by: String,
    /// SHA-256 hex digest of the acceptance token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Current lifecycle status.
    pub status: InvitationStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Acceptance deadline.
    pub expires_at: DateTime<Utc>,
    /// Acceptance timestamp.
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Construct a new pending invitation valid for `expiry_days`.
    #[must_use]
    pub fn new(
        email: String,
        role: Role,
        school_id: Option<String>,
        invited_by: String,
        token_hash: String,
        expiry_days: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            role,
            school_id,
            invited_by,
            token_hash,
            status: InvitationStatus::Pending,
            created_at: now,
            expires_at: now + Duration::days(i64::from(expiry_days)),
            accepted_at: None,
        }
    }

    /// Whether the invitation can still be accepted at `now`.
    #[must_use]
    pub fn is_acceptable(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && now < self.expires_at
    }
}

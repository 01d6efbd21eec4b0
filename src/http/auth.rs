//! Caller identification and permission checks.
//!
//! The upstream gateway authenticates the session and forwards the user id
//! in the `x-user-id` header. The account must exist and be active.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;

use crate::models::user::{Permission, UserProfile};
use crate::{AppError, Result};

use super::state::AppState;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The identified, active caller.
#[derive(Debug, Clone)]
pub struct Caller(pub UserProfile);

impl Caller {
    /// Caller's user id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Fail unless the caller's role grants `permission`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` when the role lacks the permission.
    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.0.role.permits(permission) {
            Ok(())
        } else {
            debug!(
                user_id = %self.0.id,
                role = self.0.role.as_str(),
                ?permission,
                "permission denied"
            );
            Err(AppError::Forbidden(format!(
                "{} may not {}",
                self.0.role.as_str(),
                describe(permission)
            )))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;

        let user = state
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("unknown user {user_id}")))?;
        if !user.is_active {
            return Err(AppError::Forbidden("account is deactivated".into()));
        }
        Ok(Self(user))
    }
}

fn describe(permission: Permission) -> &'static str {
    match permission {
        Permission::ManageUsers => "manage users",
        Permission::ManageInvitations => "manage invitations",
        Permission::ReviewSubmissions => "review submissions",
        Permission::ReviewDuplicates => "review duplicate lessons",
        Permission::ViewAnalytics => "view analytics",
    }
}

//! Invitation lifecycle: invite, resend, revoke, accept.
//!
//! The raw token only ever leaves the service inside the invitation email;
//! the database stores its SHA-256 digest.

use chrono::{Duration, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::models::invitation::{Invitation, InvitationStatus};
use crate::models::user::{Role, UserProfile};
use crate::models::{Page, PageRequest};
use crate::persistence::invitation_repo::InvitationRepo;
use crate::persistence::user_repo::UserRepo;
use crate::platform::{EmailMessage, EmailTemplate, Mailer};
use crate::{AppError, Result};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Body of the invite form.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewInvitation {
    /// Invitee address.
    pub email: String,
    /// Role granted on acceptance.
    pub role: Role,
    /// School the invitee joins.
    #[serde(default)]
    pub school_id: Option<String>,
}

/// Body of the accept form.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AcceptInvitation {
    /// Raw token from the email link.
    pub token: String,
    /// Name the new user chose.
    pub display_name: String,
}

/// Query string accepted by the invitation list.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct InvitationQuery {
    /// Status filter.
    pub status: Option<InvitationStatus>,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Invitation controller.
#[derive(Clone)]
pub struct Invitations {
    repo: InvitationRepo,
    users: UserRepo,
    mailer: Mailer,
    public_url: String,
    expiry_days: u32,
    email_pattern: Regex,
}

impl Invitations {
    /// Build the controller.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the email pattern fails to compile.
    pub fn new(
        repo: InvitationRepo,
        users: UserRepo,
        mailer: Mailer,
        public_url: impl Into<String>,
        expiry_days: u32,
    ) -> Result<Self> {
        let email_pattern = Regex::new(EMAIL_PATTERN)
            .map_err(|err| AppError::Config(format!("invalid email pattern: {err}")))?;
        Ok(Self {
            repo,
            users,
            mailer,
            public_url: public_url.into(),
            expiry_days,
            email_pattern,
        })
    }

    /// Invite `new.email`, queueing the invitation email.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a malformed address and
    /// `AppError::Conflict` when the address already has an account or a
    /// pending invitation.
    pub async fn create(&self, new: &NewInvitation, invited_by: &str) -> Result<Invitation> {
        let email = new.email.trim().to_lowercase();
        if !self.email_pattern.is_match(&email) {
            return Err(AppError::Validation(format!(
                "'{}' is not a valid email address",
                new.email.trim()
            )));
        }
        if self.users.email_exists(&email).await? {
            return Err(AppError::Conflict(format!("{email} already has an account")));
        }
        if self.repo.get_pending_for_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "{email} already has a pending invitation"
            )));
        }

        let token = generate_token();
        let school_id = new
            .school_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let invitation = Invitation::new(
            email,
            new.role,
            school_id,
            invited_by.to_owned(),
            sha256_hex(token.as_bytes()),
            self.expiry_days,
        );
        let span = info_span!("create_invitation", invitation_id = %invitation.id);
        let invitation = self.repo.create(&invitation).instrument(span).await?;

        self.send_invitation(&invitation, &token);
        info!(
            invitation_id = %invitation.id,
            role = invitation.role.as_str(),
            "invitation created"
        );
        Ok(invitation)
    }

    /// One page of invitations, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self, query: &InvitationQuery) -> Result<Page<Invitation>> {
        self.repo
            .list(query.status, PageRequest::new(query.page, query.per_page))
            .await
    }

    /// Issue a fresh token and expiry for a pending invitation and email it again.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id and `AppError::Conflict`
    /// when the invitation is no longer pending.
    pub async fn resend(&self, id: &str) -> Result<Invitation> {
        let invitation = self.pending(id).await?;
        let token = generate_token();
        let expires_at = Utc::now() + Duration::days(i64::from(self.expiry_days));
        self.repo
            .renew(id, &sha256_hex(token.as_bytes()), expires_at)
            .await?;

        let renewed = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("invitation {}", invitation.id)))?;
        self.send_invitation(&renewed, &token);
        info!(invitation_id = id, "invitation resent");
        Ok(renewed)
    }

    /// Revoke a pending invitation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id and `AppError::Conflict`
    /// when the invitation is no longer pending.
    pub async fn revoke(&self, id: &str) -> Result<()> {
        self.pending(id).await?;
        self.repo.update_status(id, InvitationStatus::Revoked).await?;
        info!(invitation_id = id, "invitation revoked");
        Ok(())
    }

    /// Redeem a token: create the user, mark the invitation accepted, and
    /// queue a welcome email.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an empty display name,
    /// `AppError::NotFound` for an unknown token, and `AppError::Conflict`
    /// when the invitation is not pending or has expired.
    pub async fn accept(&self, accept: &AcceptInvitation) -> Result<UserProfile> {
        let display_name = accept.display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::Validation("display name must not be empty".into()));
        }

        let invitation = self
            .repo
            .get_by_token_hash(&sha256_hex(accept.token.trim().as_bytes()))
            .await?
            .ok_or_else(|| AppError::NotFound("invitation token".into()))?;

        let now = Utc::now();
        if !invitation.is_acceptable(now) {
            if invitation.status == InvitationStatus::Pending {
                self.repo
                    .update_status(&invitation.id, InvitationStatus::Expired)
                    .await?;
            }
            return Err(AppError::Conflict("this invitation is no longer valid".into()));
        }

        self.repo.mark_accepted(&invitation.id, now).await?;
        let mut user = UserProfile::new(
            display_name.to_owned(),
            invitation.role,
            invitation.school_id.clone(),
        );
        user.last_sign_in_at = Some(now);
        let user = self.users.create(&user, Some(&invitation.email)).await?;

        self.mailer.send(EmailMessage {
            to: invitation.email.clone(),
            template: EmailTemplate::Welcome,
            data: json!({
                "display_name": user.display_name,
                "role": user.role.as_str(),
                "sign_in_url": format!("{}/sign-in", self.public_url),
            }),
        });
        info!(invitation_id = %invitation.id, user_id = %user.id, "invitation accepted");
        Ok(user)
    }

    async fn pending(&self, id: &str) -> Result<Invitation> {
        let invitation = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("invitation {id}")))?;
        if invitation.status != InvitationStatus::Pending {
            warn!(
                invitation_id = id,
                status = invitation.status.as_str(),
                "invitation not pending"
            );
            return Err(AppError::Conflict(format!(
                "invitation {id} is {}",
                invitation.status.as_str()
            )));
        }
        Ok(invitation)
    }

    fn send_invitation(&self, invitation: &Invitation, token: &str) {
        self.mailer.send(EmailMessage {
            to: invitation.email.clone(),
            template: EmailTemplate::Invitation,
            data: json!({
                "role": invitation.role.as_str(),
                "accept_url": format!("{}/accept-invite?token={token}", self.public_url),
                "expires_at": invitation.expires_at.to_rfc3339(),
            }),
        });
    }
}

/// Random URL-safe token with 244 bits of entropy.
fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

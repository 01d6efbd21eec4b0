//! Invitation repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::models::invitation::{Invitation, InvitationStatus};
use crate::models::user::Role;
use crate::models::{Page, PageRequest};
use crate::{AppError, Result};

use super::db::Database;
use super::{parse_opt_ts, parse_ts};

/// Repository wrapper around `SQLite` for invitation records.
#[derive(Clone)]
pub struct InvitationRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct InvitationRow {
    id: String,
    email: String,
    role: String,
    school_id: Option<String>,
    invited_by: String,
    token_hash: String,
    status: String,
    created_at: String,
    expires_at: String,
    accepted_at: Option<String>,
}

impl InvitationRow {
    fn into_invitation(self) -> Result<Invitation> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| AppError::Db(format!("invalid role: {}", self.role)))?;
        let status = InvitationStatus::parse(&self.status)
            .ok_or_else(|| AppError::Db(format!("invalid invitation status: {}", self.status)))?;

        Ok(Invitation {
            id: self.id,
            email: self.email,
            role,
            school_id: self.school_id,
            invited_by: self.invited_by,
            token_hash: self.token_hash,
            status,
            created_at: parse_ts("created_at", &self.created_at)?,
            expires_at: parse_ts("expires_at", &self.expires_at)?,
            accepted_at: parse_opt_ts("accepted_at", self.accepted_at.as_deref())?,
        })
    }
}

impl InvitationRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new invitation record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails.
    pub async fn create(&self, invitation: &Invitation) -> Result<Invitation> {
        sqlx::query(
            "INSERT INTO invitation (id, email, role, school_id, invited_by, token_hash,
             status, created_at, expires_at, accepted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&invitation.id)
        .bind(&invitation.email)
        .bind(invitation.role.as_str())
        .bind(&invitation.school_id)
        .bind(&invitation.invited_by)
        .bind(&invitation.token_hash)
        .bind(invitation.status.as_str())
        .bind(invitation.created_at.to_rfc3339())
        .bind(invitation.expires_at.to_rfc3339())
        .bind(invitation.accepted_at.map(|dt| dt.to_rfc3339()))
        .execute(self.db.as_ref())
        .await?;

        Ok(invitation.clone())
    }

    /// Retrieve an invitation by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Invitation>> {
        let row: Option<InvitationRow> = sqlx::query_as("SELECT * FROM invitation WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(InvitationRow::into_invitation).transpose()
    }

    /// Retrieve an invitation by its token digest.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_token_hash(&self, token_hash: &str) -> Result<Option<Invitation>> {
        let row: Option<InvitationRow> =
            sqlx::query_as("SELECT * FROM invitation WHERE token_hash = ?1")
                .bind(token_hash)
                .fetch_optional(self.db.as_ref())
                .await?;

        row.map(InvitationRow::into_invitation).transpose()
    }

    /// Retrieve the pending invitation for an email, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_pending_for_email(&self, email: &str) -> Result<Option<Invitation>> {
        let row: Option<InvitationRow> = sqlx::query_as(
            "SELECT * FROM invitation WHERE email = ?1 AND status = 'pending' LIMIT 1",
        )
        .bind(email)
        .fetch_optional(self.db.as_ref())
        .await?;

        row.map(InvitationRow::into_invitation).transpose()
    }

    /// List one page of invitations, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if either query fails.
    pub async fn list(
        &self,
        status: Option<InvitationStatus>,
        page: PageRequest,
    ) -> Result<Page<Invitation>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM invitation");
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM invitation");
        if let Some(status) = status {
            count_qb.push(" WHERE status = ").push_bind(status.as_str());
            qb.push(" WHERE status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.db.as_ref())
            .await?;
        let rows: Vec<InvitationRow> = qb.build_query_as().fetch_all(self.db.as_ref()).await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(InvitationRow::into_invitation)
                .collect::<Result<_>>()?,
            total: u64::try_from(total).unwrap_or_default(),
            page: page.page,
            per_page: page.per_page,
        })
    }

    /// List every invitation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Invitation>> {
        let rows: Vec<InvitationRow> =
            sqlx::query_as("SELECT * FROM invitation ORDER BY created_at")
                .fetch_all(self.db.as_ref())
                .await?;
        rows.into_iter().map(InvitationRow::into_invitation).collect()
    }

    /// Update the status of an invitation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn update_status(&self, id: &str, status: InvitationStatus) -> Result<()> {
        sqlx::query("UPDATE invitation SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id)
            .execute(self.db.as_ref())
            .await?;
        Ok(())
    }

    /// Replace the token and push out the expiry of a pending invitation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn renew(&self, id: &str, token_hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE invitation SET token_hash = ?1, expires_at = ?2 WHERE id = ?3")
            .bind(token_hash)
            .bind(expires_at.to_rfc3339())
            .bind(id)
            .execute(self.db.as_ref())
            .await?;
        Ok(())
    }

    /// Mark a pending invitation accepted.
    ///
    /// Returns `AppError::Conflict` if the invitation is no longer pending.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn mark_accepted(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE invitation SET status = 'accepted', accepted_at = ?1
             WHERE id = ?2 AND status = 'pending'",
        )
        .bind(at.to_rfc3339())
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "invitation {id} is no longer pending"
            )));
        }
        Ok(())
    }

    /// Mark pending invitations past their expiry as expired.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE invitation SET status = 'expired'
             WHERE status = 'pending' AND expires_at < ?1",
        )
        .bind(now.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete revoked or expired invitations created before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn purge_closed_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM invitation
             WHERE status IN ('revoked', 'expired') AND created_at < ?1",
        )
        .bind(cutoff.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;
        Ok(result.rows_affected())
    }
}

//! User management: filtered listing, detail edits, and bulk actions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::user::{Role, UserProfile};
use crate::models::{Page, PageRequest};
use crate::persistence::user_repo::{UserFilter, UserRepo, UserSort, UserUpdate};
use crate::{AppError, Result};

/// Query string accepted by the user list.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct UserQuery {
    /// Case-insensitive display-name search.
    pub search: Option<String>,
    /// Exact role.
    pub role: Option<Role>,
    /// Active flag.
    pub active: Option<bool>,
    /// Exact school.
    pub school_id: Option<String>,
    /// Sort order.
    #[serde(default)]
    pub sort: UserSort,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// A user row with its email and school name joined in.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserListItem {
    /// Profile fields.
    #[serde(flatten)]
    pub user: UserProfile,
    /// Login email, if recorded.
    pub email: Option<String>,
    /// School display name, if the user belongs to one.
    pub school_name: Option<String>,
}

/// Bulk action applied to many users at once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    /// Allow sign-in.
    Activate,
    /// Block sign-in.
    Deactivate,
    /// Remove the profile and email.
    Delete,
}

/// Bulk action request body.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BulkRequest {
    /// Action to apply.
    pub action: BulkAction,
    /// Target users.
    pub user_ids: Vec<String>,
}

/// Which targets were changed and which did not exist.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BulkReport {
    /// Users the action was applied to.
    pub affected: Vec<String>,
    /// Ids with no matching user.
    pub missing: Vec<String>,
}

/// One page of users with emails and school names.
///
/// # Errors
///
/// Returns `AppError::Db` if any query fails.
pub async fn list_users(repo: &UserRepo, query: &UserQuery) -> Result<Page<UserListItem>> {
    let filter = UserFilter {
        search: query.search.clone(),
        role: query.role,
        active: query.active,
        school_id: query.school_id.clone(),
    };
    let page = repo
        .list(&filter, query.sort, PageRequest::new(query.page, query.per_page))
        .await?;

    let items = join_details(repo, page.items).await?;
    Ok(Page {
        items,
        total: page.total,
        page: page.page,
        per_page: page.per_page,
    })
}

/// A single user with email and school name.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the user does not exist.
pub async fn get_user(repo: &UserRepo, id: &str) -> Result<UserListItem> {
    let user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    let mut items = join_details(repo, vec![user]).await?;
    items
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

/// Apply a detail-form edit.
///
/// # Errors
///
/// Returns `AppError::Validation` for an empty display name or
/// `AppError::NotFound` if the user does not exist.
pub async fn update_user(repo: &UserRepo, id: &str, update: &UserUpdate) -> Result<UserListItem> {
    if update
        .display_name
        .as_deref()
        .is_some_and(|n| n.trim().is_empty())
    {
        return Err(AppError::Validation("display name must not be empty".into()));
    }
    if !repo.update(id, update).await? {
        return Err(AppError::NotFound(format!("user {id}")));
    }
    info!(user_id = id, "user updated");
    get_user(repo, id).await
}

/// Apply `request.action` to every listed user, one statement per id.
///
/// Ids that match no user are reported back rather than failing the batch.
/// The acting user cannot deactivate or delete themselves.
///
/// # Errors
///
/// Returns `AppError::Validation` for an empty id list or a self-targeting
/// destructive action, or `AppError::Db` if a statement fails.
pub async fn bulk_update(
    repo: &UserRepo,
    request: &BulkRequest,
    acting_user_id: &str,
) -> Result<BulkReport> {
    if request.user_ids.is_empty() {
        return Err(AppError::Validation("no users selected".into()));
    }
    if request.action != BulkAction::Activate
        && request.user_ids.iter().any(|id| id == acting_user_id)
    {
        return Err(AppError::Validation(
            "you cannot deactivate or delete your own account".into(),
        ));
    }

    let mut report = BulkReport::default();
    for id in &request.user_ids {
        let changed = match request.action {
            BulkAction::Activate => repo.set_active(id, true).await?,
            BulkAction::Deactivate => repo.set_active(id, false).await?,
            BulkAction::Delete => repo.delete(id).await?,
        };
        if changed {
            report.affected.push(id.clone());
        } else {
            report.missing.push(id.clone());
        }
    }

    if !report.missing.is_empty() {
        warn!(
            action = ?request.action,
            missing = ?report.missing,
            "bulk action skipped unknown users"
        );
    }
    info!(
        action = ?request.action,
        affected = report.affected.len(),
        "bulk action applied"
    );
    Ok(report)
}

async fn join_details(repo: &UserRepo, users: Vec<UserProfile>) -> Result<Vec<UserListItem>> {
    let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
    let school_ids: Vec<String> = users.iter().filter_map(|u| u.school_id.clone()).collect();
    let mut emails = repo.emails_for(&ids).await?;
    let schools: HashMap<String, String> = repo.school_names_for(&school_ids).await?;

    Ok(users
        .into_iter()
        .map(|user| UserListItem {
            email: emails.remove(&user.id),
            school_name: user
                .school_id
                .as_deref()
                .and_then(|s| schools.get(s).cloned()),
            user,
        })
        .collect())
}

//! Read-only dashboard counts.
//!
//! Rows are fetched whole and grouped in memory; every known category is
//! present in the output, with zero when nothing matches.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::invitation::InvitationStatus;
use crate::models::resolution::ResolutionKind;
use crate::models::submission::SubmissionStatus;
use crate::models::user::Role;
use crate::persistence::invitation_repo::InvitationRepo;
use crate::persistence::lesson_repo::LessonRepo;
use crate::persistence::resolution_repo::ResolutionRepo;
use crate::persistence::submission_repo::SubmissionRepo;
use crate::persistence::user_repo::UserRepo;
use crate::Result;

/// Window used for the recent sign-up count.
pub const RECENT_SIGNUP_DAYS: i64 = 30;

/// Repositories the dashboard reads from.
#[derive(Clone)]
pub struct AnalyticsSources {
    /// User profiles.
    pub users: UserRepo,
    /// Invitations.
    pub invitations: InvitationRepo,
    /// Submissions.
    pub submissions: SubmissionRepo,
    /// Lessons.
    pub lessons: LessonRepo,
    /// Duplicate resolution journal.
    pub resolutions: ResolutionRepo,
}

/// Dashboard snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Dashboard {
    /// Users per role.
    pub users_by_role: BTreeMap<Role, u64>,
    /// Active accounts.
    pub active_users: u64,
    /// Deactivated accounts.
    pub inactive_users: u64,
    /// Accounts created in the last [`RECENT_SIGNUP_DAYS`] days.
    pub recent_signups: u64,
    /// Invitations per status.
    pub invitations_by_status: BTreeMap<InvitationStatus, u64>,
    /// Submissions per status.
    pub submissions_by_status: BTreeMap<SubmissionStatus, u64>,
    /// Lessons in the library.
    pub lessons_total: u64,
    /// Closed duplicate groups per outcome.
    pub resolutions_by_kind: BTreeMap<ResolutionKind, u64>,
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
}

/// Build the dashboard as of now.
///
/// # Errors
///
/// Returns `AppError::Db` if any query fails.
pub async fn dashboard(sources: &AnalyticsSources) -> Result<Dashboard> {
    let now = Utc::now();
    let users = sources.users.list_all().await?;
    let invitations = sources.invitations.list_all().await?;
    let submissions = sources.submissions.list_statuses().await?;
    let lessons_total = sources.lessons.count().await?;
    let resolutions = sources.resolutions.list_all().await?;

    let signup_cutoff = now - Duration::days(RECENT_SIGNUP_DAYS);
    let active_users = count(users.iter().filter(|u| u.is_active));

    Ok(Dashboard {
        users_by_role: tally(
            [Role::Admin, Role::Reviewer, Role::Teacher],
            users.iter().map(|u| u.role),
        ),
        active_users,
        inactive_users: count(users.iter()) - active_users,
        recent_signups: count(users.iter().filter(|u| u.created_at >= signup_cutoff)),
        invitations_by_status: tally(
            [
                InvitationStatus::Pending,
                InvitationStatus::Accepted,
                InvitationStatus::Revoked,
                InvitationStatus::Expired,
            ],
            invitations.iter().map(|i| i.status),
        ),
        submissions_by_status: tally(
            [
                SubmissionStatus::Pending,
                SubmissionStatus::Approved,
                SubmissionStatus::Rejected,
                SubmissionStatus::NeedsRevision,
            ],
            submissions,
        ),
        lessons_total,
        resolutions_by_kind: tally(
            [ResolutionKind::Resolved, ResolutionKind::Dismissed],
            resolutions.iter().map(|r| r.kind),
        ),
        generated_at: now,
    })
}

fn tally<K: Ord>(
    keys: impl IntoIterator<Item = K>,
    values: impl IntoIterator<Item = K>,
) -> BTreeMap<K, u64> {
    let mut counts: BTreeMap<K, u64> = keys.into_iter().map(|k| (k, 0)).collect();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    counts
}

fn count<T>(items: impl Iterator<Item = T>) -> u64 {
    items.fold(0, |n, _| n + 1)
}

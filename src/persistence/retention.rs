//! Retention service for invitation housekeeping.
//!
//! Runs as a background task: pending invitations past their expiry are
//! marked `expired`, then revoked or expired invitations older than
//! `retention_days` are deleted.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::db::Database;
use super::invitation_repo::InvitationRepo;
use crate::Result;

const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawn the retention purge background task.
///
/// The task runs hourly until `cancel` fires.
#[must_use]
pub fn spawn_retention_task(
    db: Arc<Database>,
    retention_days: u32,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let repo = InvitationRepo::new(db);
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("retention task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(err) = purge(&repo, retention_days).await {
                        error!(?err, "retention purge failed");
                    }
                }
            }
        }
    })
}

/// Run one expiry and purge pass.
///
/// Returns `(expired, purged)` row counts.
///
/// # Errors
///
/// Returns `AppError::Db` if either statement fails.
pub async fn purge(repo: &InvitationRepo, retention_days: u32) -> Result<(u64, u64)> {
    let now = Utc::now();
    let expired = repo.expire_overdue(now).await?;

    let cutoff = now - chrono::Duration::days(i64::from(retention_days));
    let purged = repo.purge_closed_before(cutoff).await?;

    info!(retention_days, expired, purged, "retention purge completed");
    Ok((expired, purged))
}

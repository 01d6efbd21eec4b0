//! [`GroupSource`] backed by the report file and the resolution journal.

use std::path::PathBuf;

use tracing::debug;

use crate::models::duplicate::DuplicateGroup;
use crate::persistence::resolution_repo::ResolutionRepo;
use crate::review::resolver::{BoxFuture, GroupSource};
use crate::Result;

use super::DuplicateReport;

/// Reads the report on every fetch so a regenerated file is picked up on reload.
#[derive(Clone)]
pub struct ReportGroupSource {
    path: PathBuf,
    resolutions: ResolutionRepo,
}

impl ReportGroupSource {
    /// Build a source over the report at `path`.
    #[must_use]
    pub fn new(path: PathBuf, resolutions: ResolutionRepo) -> Self {
        Self { path, resolutions }
    }
}

impl GroupSource for ReportGroupSource {
    fn fetch_groups(&self, include_resolved: bool) -> BoxFuture<'_, Result<Vec<DuplicateGroup>>> {
        Box::pin(async move {
            let report = DuplicateReport::load(&self.path).await?;
            if include_resolved {
                return Ok(report.groups);
            }
            let resolved = self.resolutions.resolved_group_ids().await?;
            let total = report.groups.len();
            let pending: Vec<DuplicateGroup> = report
                .groups
                .into_iter()
                .filter(|g| !resolved.contains(&g.group_id))
                .collect();
            debug!(total, pending = pending.len(), "loaded duplicate groups");
            Ok(pending)
        })
    }
}

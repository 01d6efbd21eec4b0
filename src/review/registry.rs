//! One [`DuplicateReview`] per reviewer, created on first use.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::persistence::resolution_repo::ResolutionRepo;

use super::resolver::{DuplicateResolver, GroupSource};
use super::session::{DuplicateReview, ReviewSettings};

/// Shared collaborators plus the per-reviewer controllers built from them.
pub struct ReviewRegistry {
    source: Arc<dyn GroupSource>,
    resolver: Arc<dyn DuplicateResolver>,
    journal: ResolutionRepo,
    settings: ReviewSettings,
    reviews: Mutex<HashMap<String, Arc<DuplicateReview>>>,
}

impl ReviewRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(
        source: Arc<dyn GroupSource>,
        resolver: Arc<dyn DuplicateResolver>,
        journal: ResolutionRepo,
        settings: ReviewSettings,
    ) -> Self {
        Self {
            source,
            resolver,
            journal,
            settings,
            reviews: Mutex::new(HashMap::new()),
        }
    }

    /// Controller for `reviewer_id`, creating it if needed.
    pub async fn for_reviewer(&self, reviewer_id: &str) -> Arc<DuplicateReview> {
        let mut reviews = self.reviews.lock().await;
        Arc::clone(reviews.entry(reviewer_id.to_owned()).or_insert_with(|| {
            debug!(reviewer_id, "creating duplicate review controller");
            Arc::new(DuplicateReview::new(
                reviewer_id,
                Arc::clone(&self.source),
                Arc::clone(&self.resolver),
                self.journal.clone(),
                self.settings.clone(),
            ))
        }))
    }

    /// Drop a reviewer's controller and its unsaved state.
    pub async fn remove(&self, reviewer_id: &str) -> bool {
        self.reviews.lock().await.remove(reviewer_id).is_some()
    }
}

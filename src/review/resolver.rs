//! Collaborator seams for the review workflow.
//!
//! The [`DuplicateResolver`] trait hides the remote procedures that perform
//! the actual merge or dismissal; the platform is the sole authority on
//! transactional integrity. The [`GroupSource`] trait hides where pending
//! groups come from.

use std::future::Future;
use std::pin::Pin;

use crate::models::duplicate::{
    DismissOutcome, DismissRequest, DuplicateGroup, ResolveOutcome, ResolveRequest,
};
use crate::Result;

/// Boxed future returned by the collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque remote procedures that resolve or dismiss a duplicate group.
///
/// A semantic rejection is reported as `Ok` with `success == false`;
/// `Err` means the call itself failed.
pub trait DuplicateResolver: Send + Sync {
    /// Merge a group: keep some lessons, archive the rest into kept ones.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Platform`](crate::AppError::Platform) on transport failure.
    fn resolve<'a>(&'a self, request: &'a ResolveRequest) -> BoxFuture<'a, Result<ResolveOutcome>>;

    /// Record that the lessons are not duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Platform`](crate::AppError::Platform) on transport failure.
    fn dismiss<'a>(&'a self, request: &'a DismissRequest) -> BoxFuture<'a, Result<DismissOutcome>>;
}

/// Provider of duplicate groups.
pub trait GroupSource: Send + Sync {
    /// Fetch groups in queue order, optionally including resolved ones.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Report`](crate::AppError::Report) or
    /// [`AppError::Db`](crate::AppError::Db) when the groups cannot be loaded.
    fn fetch_groups(&self, include_resolved: bool) -> BoxFuture<'_, Result<Vec<DuplicateGroup>>>;
}

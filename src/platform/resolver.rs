//! [`DuplicateResolver`] backed by the platform's stored procedures.

use tracing::{info, info_span, Instrument};

use crate::models::duplicate::{DismissOutcome, DismissRequest, ResolveOutcome, ResolveRequest};
use crate::review::resolver::{BoxFuture, DuplicateResolver};
use crate::{AppError, Result};

use super::client::PlatformClient;

/// Stored procedure that merges a group.
pub const RESOLVE_FUNCTION: &str = "resolve_duplicate_group";
/// Stored procedure that dismisses a group.
pub const DISMISS_FUNCTION: &str = "dismiss_duplicate_group";

/// Calls `resolve_duplicate_group` / `dismiss_duplicate_group` over RPC.
#[derive(Clone)]
pub struct RpcResolver {
    client: PlatformClient,
}

impl RpcResolver {
    /// Wrap a platform client.
    #[must_use]
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

impl DuplicateResolver for RpcResolver {
    fn resolve<'a>(&'a self, request: &'a ResolveRequest) -> BoxFuture<'a, Result<ResolveOutcome>> {
        let span = info_span!("rpc_resolve", group_id = %request.group_id);
        Box::pin(
            async move {
                let outcome: ResolveOutcome = self.client.rpc(RESOLVE_FUNCTION, request).await?;
                info!(
                    success = outcome.success,
                    kept = outcome.kept_count,
                    archived = outcome.archived_count,
                    "resolve procedure returned"
                );
                Ok(outcome)
            }
            .instrument(span),
        )
    }

    fn dismiss<'a>(&'a self, request: &'a DismissRequest) -> BoxFuture<'a, Result<DismissOutcome>> {
        let span = info_span!("rpc_dismiss", lessons = request.lesson_ids.len());
        Box::pin(
            async move {
                let outcome: DismissOutcome = self.client.rpc(DISMISS_FUNCTION, request).await?;
                info!(success = outcome.success, "dismiss procedure returned");
                Ok(outcome)
            }
            .instrument(span),
        )
    }
}

/// Stand-in used when no platform URL is configured; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredResolver;

impl DuplicateResolver for UnconfiguredResolver {
    fn resolve<'a>(&'a self, request: &'a ResolveRequest) -> BoxFuture<'a, Result<ResolveOutcome>> {
        Box::pin(async move {
            Err(AppError::Platform(format!(
                "cannot resolve group {}: no platform configured",
                request.group_id
            )))
        })
    }

    fn dismiss<'a>(
        &'a self,
        _request: &'a DismissRequest,
    ) -> BoxFuture<'a, Result<DismissOutcome>> {
        Box::pin(async move {
            Err(AppError::Platform(
                "cannot dismiss group: no platform configured".into(),
            ))
        })
    }
}

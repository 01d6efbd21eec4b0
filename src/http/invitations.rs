//! Invitation routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::admin::invitations::{AcceptInvitation, InvitationQuery, NewInvitation};
use crate::models::invitation::Invitation;
use crate::models::user::{Permission, UserProfile};
use crate::models::Page;

use super::auth::Caller;
use super::response::{ApiResponse, ApiResult};
use super::state::AppState;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/invitations", get(list).post(create))
        .route("/admin/invitations/{id}/resend", post(resend))
        .route("/admin/invitations/{id}", delete(revoke))
        .route("/invitations/accept", post(accept))
}

async fn list(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<InvitationQuery>,
) -> ApiResult<Page<Invitation>> {
    caller.require(Permission::ManageInvitations)?;
    Ok(ApiResponse::success(state.invitations.list(&query).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(new): Json<NewInvitation>,
) -> ApiResult<Invitation> {
    caller.require(Permission::ManageInvitations)?;
    Ok(ApiResponse::success(
        state.invitations.create(&new, caller.id()).await?,
    ))
}

async fn resend(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Invitation> {
    caller.require(Permission::ManageInvitations)?;
    Ok(ApiResponse::success(state.invitations.resend(&id).await?))
}

async fn revoke(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<()> {
    caller.require(Permission::ManageInvitations)?;
    state.invitations.revoke(&id).await?;
    Ok(ApiResponse::success(()))
}

/// Unauthenticated: the token itself is the credential.
async fn accept(
    State(state): State<Arc<AppState>>,
    Json(accept): Json<AcceptInvitation>,
) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(state.invitations.accept(&accept).await?))
}

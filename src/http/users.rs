//! User management routes under `/admin/users`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::admin::users::{self, BulkAction, BulkReport, BulkRequest, UserListItem, UserQuery};
use crate::models::user::Permission;
use crate::models::Page;
use crate::persistence::user_repo::UserUpdate;

use super::auth::Caller;
use super::response::{ApiResponse, ApiResult};
use super::state::AppState;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(list))
        .route("/admin/users/bulk", post(bulk))
        .route("/admin/users/{id}", get(detail).patch(update))
}

async fn list(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<UserQuery>,
) -> ApiResult<Page<UserListItem>> {
    caller.require(Permission::ManageUsers)?;
    Ok(ApiResponse::success(
        users::list_users(&state.users, &query).await?,
    ))
}

async fn detail(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<UserListItem> {
    caller.require(Permission::ManageUsers)?;
    Ok(ApiResponse::success(users::get_user(&state.users, &id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<UserListItem> {
    caller.require(Permission::ManageUsers)?;
    Ok(ApiResponse::success(
        users::update_user(&state.users, &id, &update).await?,
    ))
}

async fn bulk(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(request): Json<BulkRequest>,
) -> ApiResult<BulkReport> {
    caller.require(Permission::ManageUsers)?;
    let report = users::bulk_update(&state.users, &request, caller.id()).await?;
    if request.action != BulkAction::Activate {
        for id in &report.affected {
            state.reviews.remove(id).await;
        }
    }
    Ok(ApiResponse::success(report))
}

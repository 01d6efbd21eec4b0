//! Duplicate review routes under `/admin/duplicates`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::models::duplicate::Selection;
use crate::models::user::Permission;
use crate::review::{DuplicateReview, GroupView, Navigation, QueueView};
use crate::Result;

use super::auth::Caller;
use super::response::{outcome_response, ApiResponse, ApiResult};
use super::state::AppState;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/duplicates", get(queue))
        .route("/admin/duplicates/reload", post(reload))
        .route("/admin/duplicates/leave", post(leave))
        .route("/admin/duplicates/{group_id}", get(open))
        .route(
            "/admin/duplicates/{group_id}/selections/{lesson_id}",
            put(set_selection),
        )
        .route(
            "/admin/duplicates/{group_id}/quick-keep/{lesson_id}",
            post(quick_keep),
        )
        .route("/admin/duplicates/{group_id}/keep-all", post(keep_all))
        .route("/admin/duplicates/{group_id}/skip", post(skip))
        .route("/admin/duplicates/{group_id}/save", post(save))
}

#[derive(Debug, Deserialize)]
struct LeaveParams {
    #[serde(default)]
    force: bool,
}

async fn review_for(state: &AppState, caller: &Caller) -> Result<Arc<DuplicateReview>> {
    caller.require(Permission::ReviewDuplicates)?;
    Ok(state.reviews.for_reviewer(caller.id()).await)
}

async fn queue(State(state): State<Arc<AppState>>, caller: Caller) -> ApiResult<QueueView> {
    let review = review_for(&state, &caller).await?;
    Ok(ApiResponse::success(review.queue().await?))
}

async fn reload(State(state): State<Arc<AppState>>, caller: Caller) -> ApiResult<QueueView> {
    let review = review_for(&state, &caller).await?;
    Ok(ApiResponse::success(review.load().await?))
}

async fn leave(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(params): Query<LeaveParams>,
) -> ApiResult<()> {
    let review = review_for(&state, &caller).await?;
    review.leave(params.force).await?;
    Ok(ApiResponse::success(()))
}

async fn open(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(group_id): Path<String>,
) -> ApiResult<GroupView> {
    let review = review_for(&state, &caller).await?;
    Ok(ApiResponse::success(review.open(&group_id).await?))
}

async fn set_selection(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((group_id, lesson_id)): Path<(String, String)>,
    Json(selection): Json<Selection>,
) -> ApiResult<GroupView> {
    let review = review_for(&state, &caller).await?;
    let view = review
        .set_selection(&group_id, &lesson_id, selection)
        .await?;
    Ok(ApiResponse::success(view))
}

async fn quick_keep(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((group_id, lesson_id)): Path<(String, String)>,
) -> ApiResult<GroupView> {
    let review = review_for(&state, &caller).await?;
    Ok(ApiResponse::success(
        review.quick_keep(&group_id, &lesson_id).await?,
    ))
}

async fn keep_all(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(group_id): Path<String>,
) -> Result<Response> {
    let review = review_for(&state, &caller).await?;
    Ok(outcome_response(review.keep_all(&group_id).await?))
}

async fn skip(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(group_id): Path<String>,
) -> ApiResult<Navigation> {
    let review = review_for(&state, &caller).await?;
    Ok(ApiResponse::success(review.skip(&group_id).await?))
}

async fn save(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(group_id): Path<String>,
) -> Result<Response> {
    let review = review_for(&state, &caller).await?;
    Ok(outcome_response(review.save_and_next(&group_id).await?))
}

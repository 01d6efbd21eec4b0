//! Submission review and analytics routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::admin::analytics::{self, Dashboard};
use crate::admin::submissions::{self, SubmissionQuery};
use crate::models::submission::{Submission, SubmissionReview};
use crate::models::user::Permission;
use crate::models::Page;

use super::auth::Caller;
use super::response::{ApiResponse, ApiResult};
use super::state::AppState;

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/submissions", get(list))
        .route("/admin/submissions/{id}", get(detail))
        .route("/admin/submissions/{id}/review", post(review))
        .route("/admin/analytics", get(dashboard))
}

async fn list(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<SubmissionQuery>,
) -> ApiResult<Page<Submission>> {
    caller.require(Permission::ReviewSubmissions)?;
    Ok(ApiResponse::success(
        submissions::list_submissions(&state.submissions, &query).await?,
    ))
}

async fn detail(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Submission> {
    caller.require(Permission::ReviewSubmissions)?;
    Ok(ApiResponse::success(
        submissions::get_submission(&state.submissions, &id).await?,
    ))
}

async fn review(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
    Json(review): Json<SubmissionReview>,
) -> ApiResult<Submission> {
    caller.require(Permission::ReviewSubmissions)?;
    Ok(ApiResponse::success(
        submissions::review_submission(&state.submissions, &id, review, caller.id()).await?,
    ))
}

async fn dashboard(State(state): State<Arc<AppState>>, caller: Caller) -> ApiResult<Dashboard> {
    caller.require(Permission::ViewAnalytics)?;
    Ok(ApiResponse::success(analytics::dashboard(&state.analytics).await?))
}

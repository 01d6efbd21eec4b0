//! JSON envelope and error-to-status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::review::ActionOutcome;
use crate::AppError;

/// Response envelope: `{ "ok": bool, "data"?: T, "error"?: string }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Failed response with no payload.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Handler result: envelope on success, mapped [`AppError`] otherwise.
pub type ApiResult<T> = std::result::Result<ApiResponse<T>, AppError>;

/// HTTP status for an error.
#[must_use]
pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Platform(_) => StatusCode::BAD_GATEWAY,
        AppError::Config(_) | AppError::Db(_) | AppError::Io(_) | AppError::Report(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(%self, status = status.as_u16(), "request failed");
        }
        (status, ApiResponse::error(self.to_string())).into_response()
    }
}

/// Render a submit outcome: 200 when the group closed, 422 when the
/// platform refused.
#[must_use]
pub fn outcome_response(outcome: ActionOutcome) -> Response {
    match outcome {
        ActionOutcome::Completed { .. } => ApiResponse::success(outcome).into_response(),
        ActionOutcome::Rejected { ref message } => {
            let error = Some(message.clone());
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiResponse {
                    ok: false,
                    data: Some(outcome),
                    error,
                },
            )
                .into_response()
        }
    }
}

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use shelfcount_core::models::{UploadTestRequest, UploadTestResponse};
use std::sync::Arc;

/// Upload a test image through every channel
///
/// Partial channel failure still answers 200; `success` is true when at least one channel
/// stored the file. Only request and payload problems are errors.
#[utoipa::path(
    post,
    path = "/test_upload",
    tag = "uploads",
    request_body = UploadTestRequest,
    responses(
        (status = 200, description = "Per-channel upload report", body = UploadTestResponse),
        (status = 400, description = "Missing or malformed image data", body = ErrorResponse),
        (status = 413, description = "Image too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(branch = %request.branch, operation = "test_upload"))]
pub async fn test_upload(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UploadTestRequest>,
) -> Result<Json<UploadTestResponse>, HttpAppError> {
    let report = state
        .orchestrator
        .upload(&request.branch, &request.image_data)
        .await?;
    Ok(Json(UploadTestResponse::from(&report)))
}

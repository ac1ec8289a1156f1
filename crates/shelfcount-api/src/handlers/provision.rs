//! Provisioning entry point: store one encoded image under a folder path.

use crate::error::{log_error, status_for};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shelfcount_core::models::{ProvisionRequest, ProvisionResponse};
use shelfcount_core::{AppError, ErrorMetadata};
use std::sync::Arc;
use std::time::Instant;

fn failure(error: &AppError) -> Response {
    log_error(error);
    (status_for(error), Json(ProvisionResponse::failure(error.client_message()))).into_response()
}

/// Provision an image
///
/// Resolves (creating as needed) every folder of the slash-separated `folder` path, stores
/// the image under a collision-safe name and makes it publicly readable. Failures answer
/// `{success: false, error}`.
#[utoipa::path(
    post,
    path = "/api/provision",
    tag = "provisioning",
    request_body = ProvisionRequest,
    responses(
        (status = 200, description = "Image stored", body = ProvisionResponse),
        (status = 400, description = "Missing fields or malformed image data", body = ProvisionResponse),
        (status = 403, description = "Storage rejected the operation", body = ProvisionResponse),
        (status = 413, description = "Image too large", body = ProvisionResponse),
        (status = 503, description = "Storage temporarily unavailable", body = ProvisionResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(operation = "provision"))]
pub async fn provision(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProvisionRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return failure(&AppError::InvalidInput(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        }
    };

    match state.provisioner.provision(&request).await {
        Ok(response) => {
            tracing::info!(
                file_id = ?response.file_id,
                folder_id = ?response.folder_id,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Image provisioned"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => failure(&err),
    }
}

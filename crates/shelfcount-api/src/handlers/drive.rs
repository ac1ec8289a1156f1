//! Delegated storage credential for the direct channel.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use shelfcount_core::models::DriveStatusResponse;
use shelfcount_core::AppError;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthorizeDriveRequest {
    pub access_token: String,
}

/// Delegated credential status
#[utoipa::path(
    get,
    path = "/drive_status",
    tag = "drive",
    responses((status = 200, description = "Authorization status", body = DriveStatusResponse))
)]
pub async fn drive_status(State(state): State<Arc<AppState>>) -> Json<DriveStatusResponse> {
    Json(state.credentials.status().await)
}

/// Install a delegated access token
#[utoipa::path(
    post,
    path = "/authorize_drive",
    tag = "drive",
    request_body = AuthorizeDriveRequest,
    responses(
        (status = 200, description = "Credential installed", body = DriveStatusResponse),
        (status = 400, description = "Missing access token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "authorize_drive"))]
pub async fn authorize_drive(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AuthorizeDriveRequest>,
) -> Result<Json<DriveStatusResponse>, HttpAppError> {
    if !state.credentials.install(&request.access_token).await {
        return Err(AppError::InvalidInput("access_token is required".to_string()).into());
    }
    Ok(Json(state.credentials.status().await))
}

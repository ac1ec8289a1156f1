//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use shelfcount_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfcount API",
        version = "0.1.0",
        description = "Image provisioning for stock counts: folder-path provisioning, multi-channel test uploads and delegated storage credentials."
    ),
    paths(
        handlers::provision::provision,
        handlers::upload_test::test_upload,
        handlers::drive::drive_status,
        handlers::drive::authorize_drive,
    ),
    components(
        schemas(
            models::ProvisionRequest,
            models::ProvisionResponse,
            models::UploadTestRequest,
            models::UploadTestResponse,
            models::ChannelResult,
            models::DriveStatusResponse,
            handlers::drive::AuthorizeDriveRequest,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "provisioning", description = "Store an image under a folder path"),
        (name = "uploads", description = "Multi-channel test uploads"),
        (name = "drive", description = "Delegated storage credentials")
    )
)]
pub struct ApiDoc;

//! OpenAPI document served at `/api/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lumen Media API",
        description = "Media submission and approval service: two-phase uploads with quarantine verification, versioning, share tokens, validation and downloads."
    ),
    paths(
        crate::handlers::upload::sign_upload,
        crate::handlers::upload::confirm_upload,
        crate::handlers::versions::sign_version,
        crate::handlers::versions::confirm_version,
        crate::handlers::share::create_share_token,
        crate::handlers::share::list_share_tokens,
        crate::handlers::share::delete_share_token,
        crate::handlers::validate::get_validation_view,
        crate::handlers::validate::apply_decisions,
        crate::handlers::download::list_downloads,
        crate::handlers::download::download_zip,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        lumen_core::models::MediaKind,
        lumen_core::models::ReviewStatus,
        lumen_core::models::ScopeStats,
        lumen_core::models::container::EventStatus,
        lumen_core::models::share_token::TokenKind,
        lumen_core::models::upload::SignUploadRequest,
        lumen_core::models::upload::SignUploadResponse,
        lumen_core::models::upload::ConfirmUploadRequest,
        lumen_core::models::upload::ConfirmUploadResponse,
        lumen_core::models::upload::SignVersionRequest,
        lumen_core::models::upload::ConfirmVersionRequest,
        lumen_core::models::upload::ConfirmVersionResponse,
        crate::handlers::share::CreateShareRequest,
        crate::handlers::share::ShareTokenView,
        crate::handlers::validate::ValidationView,
        crate::handlers::validate::EventSummary,
        crate::handlers::validate::ProjectSummary,
        crate::handlers::validate::ReviewItemView,
        crate::handlers::validate::DecisionItem,
        crate::handlers::validate::DecisionBatchRequest,
        crate::handlers::validate::DecisionBatchResponse,
        crate::handlers::download::DownloadItemView,
        crate::handlers::download::DownloadListing,
    )),
    tags(
        (name = "uploads", description = "Two-phase media uploads"),
        (name = "versions", description = "Media resubmission"),
        (name = "share", description = "Share token management"),
        (name = "validation", description = "Anonymous review protocol"),
        (name = "downloads", description = "Token-authorized downloads")
    )
)]
pub struct ApiDoc;

pub fn openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

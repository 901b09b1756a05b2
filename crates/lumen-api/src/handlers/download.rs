//! Token-authorized downloads of approved media, individually or as a ZIP.

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::archive::{archive_filename, create_zip_archive};
use crate::services::share_link::validate_share_token;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use lumen_core::models::{Media, MediaKind, MediaScope, MediaVersion};
use lumen_core::AppError;
use lumen_storage::{DOWNLOAD_URL_EXPIRY, THUMBNAIL_URL_EXPIRY};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadItemView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub filename: String,
    pub version_number: i32,
    pub thumbnail_url: String,
    /// Signed URL for the full-resolution original.
    pub download_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadListing {
    pub media: Vec<DownloadItemView>,
}

/// List approved media with signed thumbnail and download URLs. Accepts
/// either token kind.
#[utoipa::path(
    get,
    path = "/api/download/{token}",
    tag = "downloads",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Approved media", body = DownloadListing),
        (status = 401, description = "Unknown or expired token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(operation = "download_listing"))]
pub async fn list_downloads(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let token = validate_share_token(&state.db.share_token_repository, &token, None).await?;

    let approved = approved_media(&state, &token.scope).await?;

    let mut media = Vec::with_capacity(approved.len());
    for (item, version) in approved {
        let thumbnail_url = state
            .storage
            .presigned_get_url(&version.thumbnail_key, THUMBNAIL_URL_EXPIRY)
            .await?;
        let download_url = state
            .storage
            .presigned_get_url(&version.original_key, DOWNLOAD_URL_EXPIRY)
            .await?;
        media.push(DownloadItemView {
            id: item.id,
            kind: item.kind,
            filename: item.filename,
            version_number: version.version_number,
            thumbnail_url,
            download_url,
        });
    }

    Ok(Json(DownloadListing { media }))
}

/// Package the approved originals (latest versions) into one ZIP download.
#[utoipa::path(
    get,
    path = "/api/download/{token}/zip",
    tag = "downloads",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "ZIP archive of approved originals", content_type = "application/zip"),
        (status = 401, description = "Unknown or expired token", body = ErrorResponse),
        (status = 404, description = "No approved media", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(operation = "download_zip"))]
pub async fn download_zip(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let token = validate_share_token(&state.db.share_token_repository, &token, None).await?;

    let approved = approved_media(&state, &token.scope).await?;
    if approved.is_empty() {
        return Err(AppError::NoMedia.into());
    }

    let items: Vec<(Uuid, String, String)> = approved
        .into_iter()
        .map(|(media, version)| (media.id, version.original_key, media.filename))
        .collect();
    let entry_count = items.len();

    let archive = create_zip_archive(state.storage.as_ref(), items).await?;

    let container_name = container_name(&state, &token.scope).await?;
    let filename = archive_filename(&container_name);

    tracing::info!(
        entries = entry_count,
        size_bytes = archive.len(),
        filename = %filename,
        "ZIP archive built"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        archive,
    ))
}

async fn approved_media(
    state: &AppState,
    scope: &MediaScope,
) -> Result<Vec<(Media, MediaVersion)>, HttpAppError> {
    let items = state.db.media_repository.list_by_scope(scope).await?;
    Ok(items
        .into_iter()
        .filter(|(media, _)| media.status.is_approved())
        .collect())
}

async fn container_name(state: &AppState, scope: &MediaScope) -> Result<String, HttpAppError> {
    let name = match scope {
        MediaScope::Event(id) => state
            .db
            .event_repository
            .get(*id)
            .await?
            .map(|event| event.name),
        MediaScope::Project(id) => state
            .db
            .project_repository
            .get(*id)
            .await?
            .map(|project| project.name),
    };
    Ok(name.unwrap_or_else(|| "media".to_string()))
}

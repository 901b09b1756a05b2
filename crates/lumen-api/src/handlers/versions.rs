//! Resubmission flow: sign and confirm a new version of existing media.

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::ingest::{failure_is_terminal, verify_quarantined_upload};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use lumen_core::models::{
    ConfirmVersionRequest, ConfirmVersionResponse, MediaKind, SignUploadResponse,
    SignVersionRequest, UploadSession,
};
use lumen_core::AppError;
use lumen_storage::keys;
use lumen_storage::{ORIGINAL_URL_EXPIRY, THUMBNAIL_URL_EXPIRY};
use std::sync::Arc;
use uuid::Uuid;

/// Issue a presigned PUT URL for a new version of existing media.
#[utoipa::path(
    post,
    path = "/api/media/{id}/versions",
    tag = "versions",
    params(("id" = Uuid, Path, description = "Media id")),
    request_body = SignVersionRequest,
    responses(
        (status = 200, description = "Upload ticket issued", body = SignUploadResponse),
        (status = 400, description = "Invalid input or non-versionable media", body = ErrorResponse),
        (status = 404, description = "Media or scope not found", body = ErrorResponse),
        (status = 429, description = "Too many presign requests", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = %user.0.id, media_id = %media_id, operation = "sign_version")
)]
pub async fn sign_version(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(media_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SignVersionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = user.0;

    let media = state
        .db
        .media_repository
        .get(media_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media {} not found", media_id)))?;

    // Photos are one-shot submissions; only visuals and videos iterate.
    if media.kind == MediaKind::Photo {
        return Err(AppError::UnsupportedType(
            "PHOTO media cannot be versioned".to_string(),
        )
        .into());
    }

    super::require_scope_owned(&state.db, &media.scope, user.id).await?;

    if !media.kind.accepts_content_type(&request.content_type) {
        return Err(AppError::Validation(format!(
            "Content type {} is not allowed for {} media",
            request.content_type, media.kind
        ))
        .into());
    }
    if request.size > media.kind.max_file_size() {
        return Err(AppError::FileTooLarge {
            size: request.size,
            max: media.kind.max_file_size(),
        }
        .into());
    }

    let decision = state.uploads.rate_limiter.check(user.id).await;
    if !decision.allowed {
        return Err(AppError::RateLimited {
            reset_at: decision.reset_at,
        }
        .into());
    }

    let upload_id = Uuid::new_v4();
    let quarantine_key = keys::quarantine_key(upload_id, &request.filename);
    let ttl_secs = state.config.upload_session_ttl_secs();
    let now = Utc::now();
    let expires_at = now + Duration::seconds(ttl_secs as i64);

    let url = state
        .storage
        .presigned_put_url(
            &quarantine_key,
            &request.content_type,
            std::time::Duration::from_secs(ttl_secs),
        )
        .await?;

    state
        .uploads
        .sessions
        .insert(UploadSession {
            id: upload_id,
            user_id: user.id,
            filename: request.filename,
            content_type: request.content_type.to_lowercase(),
            size: request.size,
            kind: media.kind,
            scope: media.scope,
            media_id: Some(media_id),
            quarantine_key,
            created_at: now,
            expires_at,
        })
        .await;

    Ok(Json(SignUploadResponse {
        upload_id,
        url,
        expires_at,
    }))
}

/// Confirm a version upload: verify, store under `versions/`, and put the
/// media back into review.
#[utoipa::path(
    patch,
    path = "/api/media/{id}/versions",
    tag = "versions",
    params(("id" = Uuid, Path, description = "Media id")),
    request_body = ConfirmVersionRequest,
    responses(
        (status = 201, description = "Version created", body = ConfirmVersionResponse),
        (status = 400, description = "Verification failed", body = ErrorResponse),
        (status = 403, description = "Upload belongs to another user", body = ErrorResponse),
        (status = 404, description = "Unknown or expired upload session", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = %user.0.id, media_id = %media_id, upload_id = %request.upload_id, operation = "confirm_version")
)]
pub async fn confirm_version(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(media_id): Path<Uuid>,
    Json(request): Json<ConfirmVersionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = user.0;

    // Claims the session: a concurrent confirm of the same id gets
    // SESSION_NOT_FOUND while this one runs.
    let session = state
        .uploads
        .sessions
        .take(request.upload_id)
        .await
        .ok_or(AppError::SessionNotFound)?;

    match ingest_version(&state, user.id, media_id, &session, &request).await {
        Ok(response) => Ok(response),
        Err(error) => {
            // Unless the gates already deleted the quarantined object, the
            // upload is still intact and the client may retry this confirm.
            if !failure_is_terminal(&error) {
                state.uploads.sessions.insert(session).await;
            }
            Err(error)
        }
    }
}

async fn ingest_version(
    state: &AppState,
    user_id: Uuid,
    media_id: Uuid,
    session: &UploadSession,
    request: &ConfirmVersionRequest,
) -> Result<(StatusCode, Json<ConfirmVersionResponse>), HttpAppError> {
    if session.user_id != user_id {
        return Err(AppError::Forbidden("This upload belongs to another user".to_string()).into());
    }
    if session.media_id != Some(media_id) {
        return Err(AppError::Validation(
            "Upload session does not belong to this media".to_string(),
        )
        .into());
    }

    let thumbnail = verify_quarantined_upload(
        state.storage.as_ref(),
        session,
        request.thumbnail_data_url.as_deref(),
    )
    .await?;

    // Blobs are keyed by the version row id; the version number is assigned
    // inside the insert transaction, so two racing confirms never share keys.
    let version_id = Uuid::new_v4();
    let original_key = keys::version_original_key(media_id, version_id, &session.filename);
    let thumbnail_key = keys::version_thumbnail_key(media_id, version_id);

    state
        .storage
        .move_object(&session.quarantine_key, &original_key)
        .await?;
    state
        .storage
        .put(&thumbnail_key, "image/webp", thumbnail)
        .await?;

    let (media, version) = state
        .db
        .media_repository
        .insert_version(
            media_id,
            version_id,
            &original_key,
            &thumbnail_key,
            request.notes.as_deref(),
            user_id,
            &session.filename,
            &session.content_type,
            session.size,
        )
        .await?;

    let thumbnail_url = state
        .storage
        .presigned_get_url(&thumbnail_key, THUMBNAIL_URL_EXPIRY)
        .await?;
    let original_url = state
        .storage
        .presigned_get_url(&original_key, ORIGINAL_URL_EXPIRY)
        .await?;

    tracing::info!(
        media_id = %media.id,
        version_number = version.version_number,
        "Version confirmed, media back in review"
    );

    Ok((
        StatusCode::CREATED,
        Json(ConfirmVersionResponse {
            id: media.id,
            version_number: version.version_number,
            thumbnail_url,
            original_url,
        }),
    ))
}

//! Two-phase upload: sign a presigned PUT into quarantine, then confirm.

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::ingest::{failure_is_terminal, verify_quarantined_upload};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use lumen_core::models::{
    ConfirmUploadRequest, ConfirmUploadResponse, MediaScope, SignUploadRequest,
    SignUploadResponse, UploadSession,
};
use lumen_core::AppError;
use lumen_db::NewMedia;
use lumen_storage::keys;
use lumen_storage::THUMBNAIL_URL_EXPIRY;
use std::sync::Arc;
use uuid::Uuid;

/// Issue a presigned PUT URL for a direct upload into quarantine.
#[utoipa::path(
    post,
    path = "/api/media/upload/sign",
    tag = "uploads",
    request_body = SignUploadRequest,
    responses(
        (status = 200, description = "Upload ticket issued", body = SignUploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Scope entity not found", body = ErrorResponse),
        (status = 429, description = "Too many presign requests", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = %user.0.id, kind = %request.kind, operation = "sign_upload")
)]
pub async fn sign_upload(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<SignUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = user.0;

    if !request.kind.accepts_content_type(&request.content_type) {
        return Err(AppError::Validation(format!(
            "Content type {} is not allowed for {} uploads",
            request.content_type, request.kind
        ))
        .into());
    }
    if request.size > request.kind.max_file_size() {
        return Err(AppError::FileTooLarge {
            size: request.size,
            max: request.kind.max_file_size(),
        }
        .into());
    }

    let scope = request.scope()?;

    let decision = state.uploads.rate_limiter.check(user.id).await;
    if !decision.allowed {
        return Err(AppError::RateLimited {
            reset_at: decision.reset_at,
        }
        .into());
    }

    super::require_scope_exists(&state.db, &scope).await?;

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
            kind: request.kind,
            scope,
            media_id: None,
            quarantine_key,
            created_at: now,
            expires_at,
        })
        .await;

    tracing::info!(
        upload_id = %upload_id,
        remaining = decision.remaining,
        "Upload ticket issued"
    );

    Ok(Json(SignUploadResponse {
        upload_id,
        url,
        expires_at,
    }))
}

/// Confirm that the bytes landed in quarantine and ingest them.
#[utoipa::path(
    post,
    path = "/api/media/upload/confirm",
    tag = "uploads",
    request_body = ConfirmUploadRequest,
    responses(
        (status = 201, description = "Media created", body = ConfirmUploadResponse),
        (status = 400, description = "Verification failed", body = ErrorResponse),
        (status = 403, description = "Upload belongs to another user", body = ErrorResponse),
        (status = 404, description = "Unknown or expired upload session", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = %user.0.id, upload_id = %request.upload_id, operation = "confirm_upload")
)]
pub async fn confirm_upload(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfirmUploadRequest>,
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

    match ingest_first_upload(&state, user.id, &session, &request).await {
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

async fn ingest_first_upload(
    state: &AppState,
    user_id: Uuid,
    session: &UploadSession,
    request: &ConfirmUploadRequest,
) -> Result<(StatusCode, Json<ConfirmUploadResponse>), HttpAppError> {
    if session.user_id != user_id {
        return Err(AppError::Forbidden("This upload belongs to another user".to_string()).into());
    }
    if session.media_id.is_some() {
        return Err(AppError::Validation(
            "This upload was signed for a version resubmission".to_string(),
        )
        .into());
    }

    let thumbnail = verify_quarantined_upload(
        state.storage.as_ref(),
        session,
        request.thumbnail_data_url.as_deref(),
    )
    .await?;

    let media_id = Uuid::new_v4();
    let original_key = keys::original_key(&session.scope, media_id, &session.filename);
    let thumbnail_key = keys::thumbnail_key(&session.scope, media_id);

    state
        .storage
        .move_object(&session.quarantine_key, &original_key)
        .await?;
    state
        .storage
        .put(&thumbnail_key, "image/webp", thumbnail)
        .await?;

    let (media, _version) = state
        .db
        .media_repository
        .create_with_initial_version(
            NewMedia {
                id: media_id,
                kind: session.kind,
                filename: session.filename.clone(),
                mime_type: session.content_type.clone(),
                size: session.size,
                width: None,
                height: None,
                scope: session.scope,
            },
            &original_key,
            &thumbnail_key,
            user_id,
        )
        .await?;

    // First upload moves a draft event into review collection.
    if let MediaScope::Event(event_id) = session.scope {
        state.db.event_repository.promote_from_draft(event_id).await?;
    }

    let thumbnail_url = state
        .storage
        .presigned_get_url(&thumbnail_key, THUMBNAIL_URL_EXPIRY)
        .await?;

    tracing::info!(media_id = %media.id, "Upload confirmed and ingested");

    Ok((
        StatusCode::CREATED,
        Json(ConfirmUploadResponse {
            id: media.id,
            kind: media.kind,
            filename: media.filename,
            thumbnail_url,
        }),
    ))
}

//! Share token management for event owners.

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::share_link;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use lumen_core::models::{MediaScope, ShareToken, TokenKind};
use lumen_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareRequest {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    #[validate(length(max = 100, message = "Label must be at most 100 characters"))]
    pub label: Option<String>,
    #[validate(range(min = 1, max = 365, message = "Expiry must be between 1 and 365 days"))]
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareTokenView {
    pub id: Uuid,
    pub token: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub label: Option<String>,
    /// Full shareable URL (`{base}/v/{token}` or `{base}/d/{token}`).
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
}

impl ShareTokenView {
    fn from_token(token: ShareToken, base_url: &str) -> Self {
        let url = share_link::share_url(base_url, &token);
        Self {
            id: token.id,
            token: token.token,
            kind: token.kind,
            label: token.label,
            url,
            expires_at: token.expires_at,
            last_used_at: token.last_used_at,
            usage_count: token.usage_count,
            created_at: token.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteShareQuery {
    pub token_id: Uuid,
}

/// Mint a share token for an event the caller owns.
#[utoipa::path(
    post,
    path = "/api/events/{id}/share",
    tag = "share",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = CreateShareRequest,
    responses(
        (status = 201, description = "Token created", body = ShareTokenView),
        (status = 404, description = "Event not found or not owned", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(user_id = %user.0.id, event_id = %event_id, operation = "create_share_token")
)]
pub async fn create_share_token(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateShareRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = MediaScope::Event(event_id);
    super::require_scope_owned(&state.db, &scope, user.0.id).await?;

    let token_str = share_link::generate_token();
    let expires_at = request
        .expires_in_days
        .map(|days| Utc::now() + Duration::days(days));

    let token = state
        .db
        .share_token_repository
        .create(
            &token_str,
            request.kind,
            scope,
            request.label.as_deref(),
            expires_at,
        )
        .await?;

    tracing::info!(token_id = %token.id, kind = ?token.kind, "Share token created");

    Ok((
        StatusCode::CREATED,
        Json(ShareTokenView::from_token(token, state.config.app_base_url())),
    ))
}

/// List the event's share tokens, newest first.
#[utoipa::path(
    get,
    path = "/api/events/{id}/share",
    tag = "share",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Tokens for the event", body = [ShareTokenView]),
        (status = 404, description = "Event not found or not owned", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.0.id, event_id = %event_id))]
pub async fn list_share_tokens(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = MediaScope::Event(event_id);
    super::require_scope_owned(&state.db, &scope, user.0.id).await?;

    let tokens = state.db.share_token_repository.list_by_scope(&scope).await?;
    let base_url = state.config.app_base_url();
    let views: Vec<ShareTokenView> = tokens
        .into_iter()
        .map(|t| ShareTokenView::from_token(t, base_url))
        .collect();

    Ok(Json(views))
}

/// Revoke a token. Deleting the row is the only revocation mechanism.
#[utoipa::path(
    delete,
    path = "/api/events/{id}/share",
    tag = "share",
    params(
        ("id" = Uuid, Path, description = "Event id"),
        ("tokenId" = Uuid, Query, description = "Token to revoke")
    ),
    responses(
        (status = 204, description = "Token revoked"),
        (status = 404, description = "Event or token not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state),
    fields(user_id = %user.0.id, event_id = %event_id, token_id = %query.token_id)
)]
pub async fn delete_share_token(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<DeleteShareQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = MediaScope::Event(event_id);
    super::require_scope_owned(&state.db, &scope, user.0.id).await?;

    let deleted = state
        .db
        .share_token_repository
        .delete(query.token_id, &scope)
        .await?;
    if !deleted {
        return Err(AppError::NotFound(format!(
            "Share token {} not found",
            query.token_id
        ))
        .into());
    }

    Ok(StatusCode::NO_CONTENT)
}

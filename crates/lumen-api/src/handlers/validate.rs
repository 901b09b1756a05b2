//! Anonymous validation protocol: review screens and batch decisions,
//! authorized by a Validator share token.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::services::share_link::validate_share_token;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use lumen_core::models::{
    Event, EventStatus, MediaKind, MediaScope, Project, ReviewStatus, ScopeStats, ShareToken,
    TokenKind,
};
use lumen_core::AppError;
use lumen_storage::THUMBNAIL_URL_EXPIRY;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub status: EventStatus,
}

impl From<Event> for EventSummary {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            date: event.date,
            status: event.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<Project> for ProjectSummary {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
        }
    }
}

/// One media item as a validator sees it: normalized status, signed
/// thumbnail.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItemView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub filename: String,
    pub status: ReviewStatus,
    pub version_number: i32,
    pub thumbnail_url: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSummary>,
    pub media: Vec<ReviewItemView>,
    pub stats: ScopeStats,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionItem {
    pub photo_id: Uuid,
    pub status: ReviewStatus,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBatchRequest {
    #[validate(length(min = 1, message = "At least one decision is required"))]
    pub decisions: Vec<DecisionItem>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBatchResponse {
    pub updated: u64,
    pub stats: ScopeStats,
}

/// Everything a validator screen needs, authorized by the token alone.
#[utoipa::path(
    get,
    path = "/api/validate/{token}",
    tag = "validation",
    params(("token" = String, Path, description = "Validator share token")),
    responses(
        (status = 200, description = "Review view", body = ValidationView),
        (status = 401, description = "Unknown or expired token", body = ErrorResponse),
        (status = 403, description = "Not a validator token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(operation = "validation_view"))]
pub async fn get_validation_view(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let token = validate_share_token(
        &state.db.share_token_repository,
        &token,
        Some(TokenKind::Validator),
    )
    .await?;

    let (event, project) = load_container(&state, &token).await?;

    let items = state.db.media_repository.list_by_scope(&token.scope).await?;
    let mut media = Vec::with_capacity(items.len());
    for (item, version) in items {
        let thumbnail_url = state
            .storage
            .presigned_get_url(&version.thumbnail_key, THUMBNAIL_URL_EXPIRY)
            .await?;
        media.push(ReviewItemView {
            id: item.id,
            kind: item.kind,
            filename: item.filename,
            status: item.status.review_status(),
            version_number: version.version_number,
            thumbnail_url,
            updated_at: item.updated_at,
        });
    }

    let stats = state.db.media_repository.scope_stats(&token.scope).await?;

    Ok(Json(ValidationView {
        event,
        project,
        media,
        stats,
    }))
}

/// Apply a batch of approve/reject decisions, all-or-nothing.
#[utoipa::path(
    patch,
    path = "/api/validate/{token}",
    tag = "validation",
    params(("token" = String, Path, description = "Validator share token")),
    request_body = DecisionBatchRequest,
    responses(
        (status = 200, description = "Decisions applied", body = DecisionBatchResponse),
        (status = 400, description = "Batch references media outside the scope", body = ErrorResponse),
        (status = 401, description = "Unknown or expired token", body = ErrorResponse),
        (status = 403, description = "Not a validator token", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, token, request),
    fields(batch_size = request.decisions.len(), operation = "apply_decisions")
)]
pub async fn apply_decisions(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    ValidatedJson(request): ValidatedJson<DecisionBatchRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let token = validate_share_token(
        &state.db.share_token_repository,
        &token,
        Some(TokenKind::Validator),
    )
    .await?;

    // Validators decide, they do not un-decide.
    if request
        .decisions
        .iter()
        .any(|d| d.status == ReviewStatus::Pending)
    {
        return Err(AppError::Validation(
            "Decision status must be APPROVED or REJECTED".to_string(),
        )
        .into());
    }

    let decisions: Vec<(Uuid, ReviewStatus)> = request
        .decisions
        .iter()
        .map(|d| (d.photo_id, d.status))
        .collect();

    let updated = state
        .db
        .media_repository
        .apply_decisions(&token.scope, &decisions)
        .await?;

    let stats = state.db.media_repository.scope_stats(&token.scope).await?;

    // The event is fully reviewed once nothing is pending.
    if let MediaScope::Event(event_id) = token.scope {
        if stats.all_reviewed() {
            state
                .db
                .event_repository
                .set_status(event_id, EventStatus::Reviewed)
                .await?;
        }
    }

    tracing::info!(updated, pending = stats.pending, "Review decisions applied");

    Ok(Json(DecisionBatchResponse { updated, stats }))
}

async fn load_container(
    state: &AppState,
    token: &ShareToken,
) -> Result<(Option<EventSummary>, Option<ProjectSummary>), HttpAppError> {
    match token.scope {
        MediaScope::Event(id) => {
            let event = state
                .db
                .event_repository
                .get(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;
            Ok((Some(event.into()), None))
        }
        MediaScope::Project(id) => {
            let project = state
                .db
                .project_repository
                .get(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;
            Ok((None, Some(project.into())))
        }
    }
}

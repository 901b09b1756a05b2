//! HTTP handlers, one module per route group.

pub mod download;
pub mod share;
pub mod upload;
pub mod validate;
pub mod versions;

use crate::error::HttpAppError;
use crate::state::DbState;
use lumen_core::models::MediaScope;
use lumen_core::AppError;
use uuid::Uuid;

/// The scope entity must exist before anything gets attached to it.
pub(crate) async fn require_scope_exists(
    db: &DbState,
    scope: &MediaScope,
) -> Result<(), HttpAppError> {
    let found = match scope {
        MediaScope::Event(id) => db.event_repository.get(*id).await?.is_some(),
        MediaScope::Project(id) => db.project_repository.get(*id).await?.is_some(),
    };
    if !found {
        return Err(scope_not_found(scope));
    }
    Ok(())
}

/// Ownership gate for mutations on a scope. A scope the caller does not own
/// is reported as nonexistent, so cross-tenant probes cannot enumerate ids.
pub(crate) async fn require_scope_owned(
    db: &DbState,
    scope: &MediaScope,
    user_id: Uuid,
) -> Result<(), HttpAppError> {
    let found = match scope {
        MediaScope::Event(id) => db.event_repository.get_owned(*id, user_id).await?.is_some(),
        MediaScope::Project(id) => {
            db.project_repository
                .get_owned(*id, user_id)
                .await?
                .is_some()
        }
    };
    if !found {
        return Err(scope_not_found(scope));
    }
    Ok(())
}

fn scope_not_found(scope: &MediaScope) -> HttpAppError {
    let what = match scope {
        MediaScope::Event(_) => "Event",
        MediaScope::Project(_) => "Project",
    };
    HttpAppError(AppError::NotFound(format!("{} {} not found", what, scope.id())))
}

//! Bearer session-token middleware.
//!
//! The identity store is external to this service: a session token maps to a
//! user row maintained by the surrounding platform. This layer only answers
//! "who is calling" and refuses non-active accounts; ownership checks happen
//! per handler.

use crate::error::HttpAppError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use lumen_core::models::User;
use lumen_core::AppError;
use lumen_db::UserRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub user_repository: UserRepository,
}

/// The authenticated caller, stored in request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing authentication context".to_string(),
                ))
            })
    }
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Ok(token) => token,
        Err(e) => return HttpAppError(e).into_response(),
    };

    let user = match auth_state.user_repository.find_by_session_token(token).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpAppError(AppError::Unauthorized("Invalid session token".to_string()))
                .into_response()
        }
        Err(e) => return HttpAppError(e).into_response(),
    };

    if !user.is_active() {
        return HttpAppError(AppError::AccountNotActive).into_response();
    }

    request.extensions_mut().insert(AuthUser(user));
    next.run(request).await
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })
}

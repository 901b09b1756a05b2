//! User repository: the identity oracle surface.

use lumen_core::models::User;
use lumen_core::AppError;
use sqlx::{PgPool, Postgres};

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a bearer session token to a user. Account status is the
    /// caller's concern; this only answers "who".
    pub async fn find_by_session_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let user: Option<User> = sqlx::query_as::<Postgres, User>(
            "SELECT id, email, role, status, created_at FROM users WHERE session_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

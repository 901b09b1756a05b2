//! Share token repository.

use chrono::{DateTime, Utc};
use lumen_core::models::{MediaScope, ShareToken, TokenKind};
use lumen_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct ShareTokenRow {
    id: Uuid,
    token: String,
    kind: TokenKind,
    event_id: Option<Uuid>,
    project_id: Option<Uuid>,
    label: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    last_used_at: Option<DateTime<Utc>>,
    usage_count: i64,
    created_at: DateTime<Utc>,
}

impl ShareTokenRow {
    fn into_token(self) -> Result<ShareToken, AppError> {
        let scope = MediaScope::from_columns(self.event_id, self.project_id)?;
        Ok(ShareToken {
            id: self.id,
            token: self.token,
            kind: self.kind,
            scope,
            label: self.label,
            expires_at: self.expires_at,
            last_used_at: self.last_used_at,
            usage_count: self.usage_count,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct ShareTokenRepository {
    pool: PgPool,
}

impl ShareTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(
        skip(self, token),
        fields(db.table = "share_tokens", db.operation = "insert")
    )]
    pub async fn create(
        &self,
        token: &str,
        kind: TokenKind,
        scope: MediaScope,
        label: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShareToken, AppError> {
        let (event_id, project_id) = scope.to_columns();

        let row: ShareTokenRow = sqlx::query_as::<Postgres, ShareTokenRow>(
            r#"
            INSERT INTO share_tokens (token, kind, event_id, project_id, label, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(kind)
        .bind(event_id)
        .bind(project_id)
        .bind(label)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_token()
    }

    /// Exact-match lookup. The token string is the sole credential.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<ShareToken>, AppError> {
        let row: Option<ShareTokenRow> =
            sqlx::query_as::<Postgres, ShareTokenRow>("SELECT * FROM share_tokens WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;

        row.map(ShareTokenRow::into_token).transpose()
    }

    /// Record a successful validation: bump usage and stamp last use.
    pub async fn touch_usage(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE share_tokens SET usage_count = usage_count + 1, last_used_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_by_scope(&self, scope: &MediaScope) -> Result<Vec<ShareToken>, AppError> {
        let column = match scope {
            MediaScope::Event(_) => "event_id",
            MediaScope::Project(_) => "project_id",
        };
        let query = format!(
            "SELECT * FROM share_tokens WHERE {} = $1 ORDER BY created_at DESC",
            column
        );
        let rows: Vec<ShareTokenRow> = sqlx::query_as::<Postgres, ShareTokenRow>(&query)
            .bind(scope.id())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ShareTokenRow::into_token).collect()
    }

    /// Delete a token within a scope. Returns whether a row was removed;
    /// deletion is the only revocation mechanism.
    pub async fn delete(&self, id: Uuid, scope: &MediaScope) -> Result<bool, AppError> {
        let column = match scope {
            MediaScope::Event(_) => "event_id",
            MediaScope::Project(_) => "project_id",
        };
        let query = format!("DELETE FROM share_tokens WHERE id = $1 AND {} = $2", column);
        let result = sqlx::query(&query)
            .bind(id)
            .bind(scope.id())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

//! Media and media version repository.

use chrono::{DateTime, Utc};
use lumen_core::models::{
    Media, MediaKind, MediaScope, MediaStatus, MediaVersion, ReviewStatus, ScopeStats,
};
use lumen_core::AppError;
use sqlx::{PgPool, Postgres};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Raw media row; the two nullable scope columns are folded into
/// [`MediaScope`] before a row leaves this crate.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MediaRow {
    pub id: Uuid,
    pub kind: MediaKind,
    pub status: MediaStatus,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub event_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaRow {
    pub(crate) fn into_media(self) -> Result<Media, AppError> {
        let scope = MediaScope::from_columns(self.event_id, self.project_id)?;
        Ok(Media {
            id: self.id,
            kind: self.kind,
            status: self.status,
            filename: self.filename,
            mime_type: self.mime_type,
            size: self.size,
            width: self.width,
            height: self.height,
            scope,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Fields for a new media item; keys for version 1 are passed alongside.
///
/// The id is caller-supplied because storage keys embed it and the blobs are
/// written before the row.
#[derive(Debug)]
pub struct NewMedia {
    pub id: Uuid,
    pub kind: MediaKind,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub scope: MediaScope,
}

/// SQL fragment naming the scope column. Never derived from user input.
fn scope_column(scope: &MediaScope) -> &'static str {
    match scope {
        MediaScope::Event(_) => "event_id",
        MediaScope::Project(_) => "project_id",
    }
}

#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a media item together with its first version in one
    /// transaction. A crash between the two inserts leaves nothing behind.
    #[tracing::instrument(skip(self, media), fields(db.table = "media", db.operation = "insert"))]
    pub async fn create_with_initial_version(
        &self,
        media: NewMedia,
        original_key: &str,
        thumbnail_key: &str,
        created_by: Uuid,
    ) -> Result<(Media, MediaVersion), AppError> {
        let mut tx = self.pool.begin().await?;

        let (event_id, project_id) = media.scope.to_columns();

        let row: MediaRow = sqlx::query_as::<Postgres, MediaRow>(
            r#"
            INSERT INTO media (id, kind, status, filename, mime_type, size, width, height, event_id, project_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(media.id)
        .bind(media.kind)
        .bind(MediaStatus::Draft)
        .bind(&media.filename)
        .bind(&media.mime_type)
        .bind(media.size)
        .bind(media.width)
        .bind(media.height)
        .bind(event_id)
        .bind(project_id)
        .fetch_one(&mut *tx)
        .await?;

        let version: MediaVersion = sqlx::query_as::<Postgres, MediaVersion>(
            r#"
            INSERT INTO media_versions (media_id, version_number, original_key, thumbnail_key, created_by)
            VALUES ($1, 1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(row.id)
        .bind(original_key)
        .bind(thumbnail_key)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((row.into_media()?, version))
    }

    pub async fn get(&self, media_id: Uuid) -> Result<Option<Media>, AppError> {
        let row: Option<MediaRow> =
            sqlx::query_as::<Postgres, MediaRow>("SELECT * FROM media WHERE id = $1")
                .bind(media_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(MediaRow::into_media).transpose()
    }

    /// All media of a scope, each paired with its latest version.
    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    pub async fn list_by_scope(
        &self,
        scope: &MediaScope,
    ) -> Result<Vec<(Media, MediaVersion)>, AppError> {
        let query = format!(
            "SELECT * FROM media WHERE {} = $1 ORDER BY created_at ASC",
            scope_column(scope)
        );
        let rows: Vec<MediaRow> = sqlx::query_as::<Postgres, MediaRow>(&query)
            .bind(scope.id())
            .fetch_all(&self.pool)
            .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        // One query for all latest versions, avoiding N+1.
        let versions: Vec<MediaVersion> = sqlx::query_as::<Postgres, MediaVersion>(
            r#"
            SELECT DISTINCT ON (media_id) *
            FROM media_versions
            WHERE media_id = ANY($1)
            ORDER BY media_id, version_number DESC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_media: HashMap<Uuid, MediaVersion> =
            versions.into_iter().map(|v| (v.media_id, v)).collect();

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let version = by_media.remove(&row.id).ok_or_else(|| {
                AppError::Internal(format!("media {} has no versions", row.id))
            })?;
            out.push((row.into_media()?, version));
        }
        Ok(out)
    }

    /// Insert a new version and reset the media to `InReview`.
    ///
    /// The version id is caller-supplied because storage keys embed it and
    /// the blobs are written before the row. The version number is computed
    /// here, after the media row is locked FOR UPDATE, so concurrent inserts
    /// for the same media serialize and each gets a distinct number.
    #[tracing::instrument(
        skip(self, notes),
        fields(db.table = "media_versions", db.operation = "insert")
    )]
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_version(
        &self,
        media_id: Uuid,
        version_id: Uuid,
        original_key: &str,
        thumbnail_key: &str,
        notes: Option<&str>,
        created_by: Uuid,
        filename: &str,
        mime_type: &str,
        size: i64,
    ) -> Result<(Media, MediaVersion), AppError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM media WHERE id = $1 FOR UPDATE")
                .bind(media_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(AppError::NotFound(format!("Media {} not found", media_id)));
        }

        let version: MediaVersion = sqlx::query_as::<Postgres, MediaVersion>(
            r#"
            INSERT INTO media_versions (id, media_id, version_number, original_key, thumbnail_key, notes, created_by)
            SELECT $1, $2, COALESCE(MAX(version_number), 0) + 1, $3, $4, $5, $6
            FROM media_versions
            WHERE media_id = $2
            RETURNING *
            "#,
        )
        .bind(version_id)
        .bind(media_id)
        .bind(original_key)
        .bind(thumbnail_key)
        .bind(notes)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        // A new version always re-enters review, whatever the prior status.
        let row: MediaRow = sqlx::query_as::<Postgres, MediaRow>(
            r#"
            UPDATE media
            SET status = $2, filename = $3, mime_type = $4, size = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(media_id)
        .bind(MediaStatus::InReview)
        .bind(filename)
        .bind(mime_type)
        .bind(size)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((row.into_media()?, version))
    }

    /// Apply a batch of review decisions, all-or-nothing.
    ///
    /// Every decision id must belong to the scope; one foreign id rejects
    /// the whole batch without touching any row.
    #[tracing::instrument(
        skip(self, decisions),
        fields(db.table = "media", db.operation = "update", batch_size = decisions.len())
    )]
    pub async fn apply_decisions(
        &self,
        scope: &MediaScope,
        decisions: &[(Uuid, ReviewStatus)],
    ) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "SELECT id FROM media WHERE {} = $1 FOR UPDATE",
            scope_column(scope)
        );
        let scoped: Vec<(Uuid,)> = sqlx::query_as(&query)
            .bind(scope.id())
            .fetch_all(&mut *tx)
            .await?;
        let scoped: HashSet<Uuid> = scoped.into_iter().map(|(id,)| id).collect();

        if decisions.iter().any(|(id, _)| !scoped.contains(id)) {
            return Err(AppError::InvalidMedia);
        }

        let mut updated = 0u64;
        for (id, decision) in decisions {
            let result = sqlx::query(
                "UPDATE media SET status = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(id)
            .bind(MediaStatus::from(*decision))
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }

        tx.commit().await?;

        Ok(updated)
    }

    /// Review counts for a scope, normalized through the simple status view.
    pub async fn scope_stats(&self, scope: &MediaScope) -> Result<ScopeStats, AppError> {
        let query = format!(
            "SELECT status FROM media WHERE {} = $1",
            scope_column(scope)
        );
        let statuses: Vec<(MediaStatus,)> = sqlx::query_as(&query)
            .bind(scope.id())
            .fetch_all(&self.pool)
            .await?;

        Ok(ScopeStats::from_statuses(
            statuses.into_iter().map(|(s,)| s),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(event_id: Option<Uuid>, project_id: Option<Uuid>) -> MediaRow {
        MediaRow {
            id: Uuid::new_v4(),
            kind: MediaKind::Photo,
            status: MediaStatus::Draft,
            filename: "a.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            size: 10,
            width: None,
            height: None,
            event_id,
            project_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_conversion_enforces_scope_invariant() {
        let event_id = Uuid::new_v4();
        let media = row(Some(event_id), None).into_media().unwrap();
        assert_eq!(media.scope, MediaScope::Event(event_id));

        assert!(row(None, None).into_media().is_err());
        assert!(row(Some(event_id), Some(Uuid::new_v4())).into_media().is_err());
    }

    #[test]
    fn scope_columns() {
        assert_eq!(scope_column(&MediaScope::Event(Uuid::new_v4())), "event_id");
        assert_eq!(
            scope_column(&MediaScope::Project(Uuid::new_v4())),
            "project_id"
        );
    }
}

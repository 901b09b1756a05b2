//! Event and project repositories.

use lumen_core::models::{Event, EventStatus, Project};
use lumen_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event: Option<Event> =
            sqlx::query_as::<Postgres, Event>("SELECT * FROM events WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(event)
    }

    /// Fetch an event only if the given user created it. A miss is
    /// indistinguishable from a nonexistent event.
    pub async fn get_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Event>, AppError> {
        let event: Option<Event> = sqlx::query_as::<Postgres, Event>(
            "SELECT * FROM events WHERE id = $1 AND created_by = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    pub async fn set_status(&self, id: Uuid, status: EventStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE events SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// First upload moves a draft event into review collection.
    pub async fn promote_from_draft(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE events SET status = $2, updated_at = NOW() WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(EventStatus::PendingReview)
        .bind(EventStatus::Draft)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Project>, AppError> {
        let project: Option<Project> =
            sqlx::query_as::<Postgres, Project>("SELECT * FROM projects WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(project)
    }

    pub async fn get_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Project>, AppError> {
        let project: Option<Project> = sqlx::query_as::<Postgres, Project>(
            "SELECT * FROM projects WHERE id = $1 AND created_by = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }
}

//! Media and media version models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::scope::MediaScope;

/// Kind of media asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_kind", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    Photo,
    Visual,
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "PHOTO"),
            MediaKind::Visual => write!(f, "VISUAL"),
            MediaKind::Video => write!(f, "VIDEO"),
        }
    }
}

/// Rich media lifecycle status.
///
/// Versioned media moves through a review cycle; uploading a new version
/// always resets the item to `InReview`, which is how resubmission after a
/// rejection or revision request works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaStatus {
    Draft,
    InReview,
    RevisionRequested,
    Approved,
    Rejected,
    FinalApproved,
}

/// Simple review status shown to validators.
///
/// Kept as a separate state machine from [`MediaStatus`]; validator screens
/// see the normalized view via [`MediaStatus::review_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl MediaStatus {
    /// Normalize the rich lifecycle down to the validator-facing view.
    pub fn review_status(self) -> ReviewStatus {
        match self {
            MediaStatus::Draft | MediaStatus::InReview | MediaStatus::RevisionRequested => {
                ReviewStatus::Pending
            }
            MediaStatus::Approved | MediaStatus::FinalApproved => ReviewStatus::Approved,
            MediaStatus::Rejected => ReviewStatus::Rejected,
        }
    }

    pub fn is_approved(self) -> bool {
        self.review_status() == ReviewStatus::Approved
    }
}

impl From<ReviewStatus> for MediaStatus {
    /// A validator decision mapped onto the rich lifecycle.
    fn from(status: ReviewStatus) -> Self {
        match status {
            ReviewStatus::Pending => MediaStatus::InReview,
            ReviewStatus::Approved => MediaStatus::Approved,
            ReviewStatus::Rejected => MediaStatus::Rejected,
        }
    }
}

/// A durable media asset scoped to one event or project.
///
/// The displayed and downloadable content of a media item is always its
/// latest [`MediaVersion`]; status lives on the media itself.
#[derive(Debug, Clone)]
pub struct Media {
    pub id: Uuid,
    pub kind: MediaKind,
    pub status: MediaStatus,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub scope: MediaScope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One immutable version of a media asset.
///
/// Version numbers are dense and strictly increasing from 1 for a given
/// media id; the highest number is authoritative.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MediaVersion {
    pub id: Uuid,
    pub media_id: Uuid,
    pub version_number: i32,
    pub original_key: String,
    pub thumbnail_key: String,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Aggregate review counts across one scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScopeStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl ScopeStats {
    /// Tally normalized statuses.
    pub fn from_statuses(statuses: impl IntoIterator<Item = MediaStatus>) -> Self {
        let mut stats = ScopeStats::default();
        for status in statuses {
            stats.total += 1;
            match status.review_status() {
                ReviewStatus::Pending => stats.pending += 1,
                ReviewStatus::Approved => stats.approved += 1,
                ReviewStatus::Rejected => stats.rejected += 1,
            }
        }
        stats
    }

    pub fn all_reviewed(&self) -> bool {
        self.pending == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_status_normalization() {
        assert_eq!(MediaStatus::Draft.review_status(), ReviewStatus::Pending);
        assert_eq!(MediaStatus::InReview.review_status(), ReviewStatus::Pending);
        assert_eq!(
            MediaStatus::RevisionRequested.review_status(),
            ReviewStatus::Pending
        );
        assert_eq!(
            MediaStatus::Approved.review_status(),
            ReviewStatus::Approved
        );
        assert_eq!(
            MediaStatus::FinalApproved.review_status(),
            ReviewStatus::Approved
        );
        assert_eq!(
            MediaStatus::Rejected.review_status(),
            ReviewStatus::Rejected
        );
    }

    #[test]
    fn decision_maps_to_lifecycle() {
        assert_eq!(
            MediaStatus::from(ReviewStatus::Approved),
            MediaStatus::Approved
        );
        assert_eq!(
            MediaStatus::from(ReviewStatus::Rejected),
            MediaStatus::Rejected
        );
    }

    #[test]
    fn stats_from_statuses() {
        let stats = ScopeStats::from_statuses([
            MediaStatus::Draft,
            MediaStatus::InReview,
            MediaStatus::Approved,
            MediaStatus::FinalApproved,
            MediaStatus::Rejected,
        ]);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.approved, 2);
        assert_eq!(stats.rejected, 1);
        assert!(!stats.all_reviewed());
    }

    #[test]
    fn kind_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&MediaKind::Photo).unwrap(),
            "\"PHOTO\""
        );
        assert_eq!(
            serde_json::from_str::<MediaKind>("\"VIDEO\"").unwrap(),
            MediaKind::Video
        );
    }
}

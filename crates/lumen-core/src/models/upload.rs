//! Upload session and two-phase upload protocol DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::media::MediaKind;
use super::scope::MediaScope;

/// Global upload ceiling (videos and visuals).
pub const MAX_FILE_SIZE: i64 = 500 * 1024 * 1024;
/// Stricter ceiling for visuals.
pub const MAX_VISUAL_SIZE: i64 = 50 * 1024 * 1024;
/// Presigned URL / upload session lifetime.
pub const PRESIGNED_URL_EXPIRY_SECS: u64 = 15 * 60;

const PHOTO_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

const VISUAL_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/svg+xml",
    "application/pdf",
];

const VIDEO_MIME_TYPES: &[&str] = &["video/mp4", "video/quicktime", "video/webm"];

impl MediaKind {
    /// MIME types accepted for this kind of media.
    pub fn allowed_content_types(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Photo => PHOTO_MIME_TYPES,
            MediaKind::Visual => VISUAL_MIME_TYPES,
            MediaKind::Video => VIDEO_MIME_TYPES,
        }
    }

    /// Size ceiling in bytes for this kind of media.
    pub fn max_file_size(&self) -> i64 {
        match self {
            MediaKind::Photo | MediaKind::Visual => MAX_VISUAL_SIZE,
            MediaKind::Video => MAX_FILE_SIZE,
        }
    }

    pub fn accepts_content_type(&self, content_type: &str) -> bool {
        let normalized = content_type.to_lowercase();
        self.allowed_content_types().contains(&normalized.as_str())
    }
}

/// Ephemeral record binding one in-flight upload to its quarantine key.
///
/// Lives in process memory only; consumed exactly once, either by a
/// successful confirm or by a validation failure that rejects the upload.
/// A process restart invalidates all in-flight uploads.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub kind: MediaKind,
    pub scope: MediaScope,
    /// Media item this upload adds a version to, when resubmitting.
    pub media_id: Option<Uuid>,
    pub quarantine_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl UploadSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Request a presigned URL for a direct upload into quarantine.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUploadRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Content type must be between 1 and 100 characters"
    ))]
    pub content_type: String,
    /// Declared file size in bytes. Verified byte-for-byte at confirm time.
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub size: i64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub event_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
}

impl SignUploadRequest {
    /// Exactly one of `eventId` / `projectId` must be set.
    pub fn scope(&self) -> Result<MediaScope, crate::AppError> {
        match (self.event_id, self.project_id) {
            (Some(id), None) => Ok(MediaScope::Event(id)),
            (None, Some(id)) => Ok(MediaScope::Project(id)),
            _ => Err(crate::AppError::Validation(
                "Exactly one of eventId or projectId must be provided".to_string(),
            )),
        }
    }
}

/// Response carrying the quarantine upload ticket.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUploadResponse {
    pub upload_id: Uuid,
    /// Presigned PUT URL the client uploads to directly.
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Confirm that the bytes landed in quarantine.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmUploadRequest {
    pub upload_id: Uuid,
    /// Base64 data URL of a client-extracted video frame. Required for
    /// video uploads; ignored otherwise.
    pub thumbnail_data_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmUploadResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub filename: String,
    pub thumbnail_url: String,
}

/// Request a presigned URL for a new version of existing media.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignVersionRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Content type must be between 1 and 100 characters"
    ))]
    pub content_type: String,
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub size: i64,
}

/// Confirm a version upload.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmVersionRequest {
    pub upload_id: Uuid,
    pub thumbnail_data_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmVersionResponse {
    pub id: Uuid,
    pub version_number: i32,
    pub thumbnail_url: String,
    pub original_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_allow_lists() {
        assert!(MediaKind::Photo.accepts_content_type("image/jpeg"));
        assert!(MediaKind::Photo.accepts_content_type("IMAGE/JPEG"));
        assert!(!MediaKind::Photo.accepts_content_type("application/pdf"));
        assert!(MediaKind::Visual.accepts_content_type("application/pdf"));
        assert!(MediaKind::Video.accepts_content_type("video/quicktime"));
        assert!(!MediaKind::Video.accepts_content_type("image/png"));
    }

    #[test]
    fn size_ceilings() {
        assert_eq!(MediaKind::Video.max_file_size(), MAX_FILE_SIZE);
        assert_eq!(MediaKind::Visual.max_file_size(), MAX_VISUAL_SIZE);
    }

    #[test]
    fn sign_request_requires_exactly_one_scope() {
        let mut request = SignUploadRequest {
            filename: "clip.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            size: 1024,
            kind: MediaKind::Video,
            event_id: Some(Uuid::new_v4()),
            project_id: None,
        };
        assert!(request.scope().is_ok());

        request.project_id = Some(Uuid::new_v4());
        assert!(request.scope().is_err());

        request.event_id = None;
        assert!(request.scope().is_ok());

        request.project_id = None;
        assert!(request.scope().is_err());
    }

    #[test]
    fn session_expiry() {
        let now = Utc::now();
        let session = UploadSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            filename: "a.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            size: 10,
            kind: MediaKind::Photo,
            scope: MediaScope::Event(Uuid::new_v4()),
            media_id: None,
            quarantine_key: "quarantine/x.jpg".to_string(),
            created_at: now,
            expires_at: now + chrono::Duration::seconds(900),
        };
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + chrono::Duration::seconds(901)));
    }
}

//! Quarantine verification pipeline shared by first uploads and versions.
//!
//! Confirming an upload runs a fixed sequence of hard gates against the
//! quarantined object. Integrity failures (size or type mismatch, empty file)
//! delete the quarantined object before returning; those attempts are
//! terminal and the client must re-sign. Every other failure leaves the
//! object in quarantine, so the caller restores the session and the client
//! retries the same confirm.

use crate::error::HttpAppError;
use lumen_core::models::{MediaKind, UploadSession};
use lumen_core::AppError;
use lumen_processing::{
    generate_thumbnail, placeholder_thumbnail, thumbnail_from_data_url, verify_content_type,
    SNIFF_LENGTH,
};
use lumen_storage::Storage;

/// Run the confirm-time gates in order: object exists, not empty, stored
/// size matches the declared size, magic bytes match the declared content
/// type, thumbnail obtainable. Only the leading bytes are fetched for the
/// sniff; full bytes flow through memory only when the thumbnailer needs
/// them. Returns the webp thumbnail to store next to the original; the
/// original itself stays in quarantine for the caller to move.
#[tracing::instrument(
    skip(storage, session, thumbnail_data_url),
    fields(upload_id = %session.id, quarantine_key = %session.quarantine_key)
)]
pub async fn verify_quarantined_upload(
    storage: &dyn Storage,
    session: &UploadSession,
    thumbnail_data_url: Option<&str>,
) -> Result<Vec<u8>, HttpAppError> {
    let key = session.quarantine_key.as_str();

    if !storage.exists(key).await? {
        return Err(AppError::FileNotUploaded.into());
    }

    let actual = storage.content_length(key).await? as i64;
    if actual == 0 {
        reject(storage, key).await;
        return Err(AppError::EmptyFile.into());
    }
    if actual != session.size {
        reject(storage, key).await;
        return Err(AppError::SizeMismatch {
            declared: session.size,
            actual,
        }
        .into());
    }

    let sniff_len = (actual as u64).min(SNIFF_LENGTH as u64);
    let sniff = storage.download_range(key, 0, sniff_len).await?;
    let verification = verify_content_type(&sniff, &session.content_type);
    if !verification.valid {
        reject(storage, key).await;
        return Err(AppError::TypeMismatch {
            expected: session.content_type.clone(),
            detected: verification.detected.map(str::to_string),
        }
        .into());
    }

    build_thumbnail(storage, session, thumbnail_data_url).await
}

/// After a failed confirm, decides whether the session may be restored for
/// another attempt. Gate failures that deleted the quarantined object are
/// terminal; anything else (bad thumbnail, storage or database trouble)
/// leaves the blob in place and the same confirm can be replayed.
pub fn failure_is_terminal(error: &HttpAppError) -> bool {
    matches!(
        error.0,
        AppError::EmptyFile | AppError::SizeMismatch { .. } | AppError::TypeMismatch { .. }
    )
}

/// Videos never flow through the server-side decoder: the client extracts a
/// frame and sends it as a data URL. PDFs and SVGs get a flat placeholder
/// card instead of being rasterized. Only the raster-image path needs the
/// full object bytes.
async fn build_thumbnail(
    storage: &dyn Storage,
    session: &UploadSession,
    thumbnail_data_url: Option<&str>,
) -> Result<Vec<u8>, HttpAppError> {
    if session.kind == MediaKind::Video {
        let data_url = thumbnail_data_url.ok_or(AppError::ThumbnailRequired)?;
        return Ok(thumbnail_from_data_url(data_url).await?);
    }

    match session.content_type.as_str() {
        "application/pdf" => Ok(placeholder_thumbnail("pdf")),
        "image/svg+xml" => Ok(placeholder_thumbnail("svg")),
        _ => {
            let data = storage.download(session.quarantine_key.as_str()).await?;
            Ok(generate_thumbnail(data).await?)
        }
    }
}

/// Best-effort removal of a failed upload from quarantine. The object is
/// unreachable either way once the session is gone; a leftover is only a
/// storage-cost concern.
async fn reject(storage: &dyn Storage, key: &str) {
    if let Err(e) = storage.delete(key).await {
        tracing::warn!(error = %e, key = %key, "Failed to delete rejected upload from quarantine");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use lumen_core::models::MediaScope;
    use lumen_storage::LocalStorage;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn session(kind: MediaKind, content_type: &str, size: i64, key: &str) -> UploadSession {
        let now = Utc::now();
        UploadSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            filename: "submission.bin".to_string(),
            content_type: content_type.to_string(),
            size,
            kind,
            scope: MediaScope::Event(Uuid::new_v4()),
            media_id: None,
            quarantine_key: key.to_string(),
            created_at: now,
            expires_at: now + Duration::seconds(900),
        }
    }

    async fn storage(dir: &tempfile::TempDir) -> LocalStorage {
        LocalStorage::new(dir.path(), "http://localhost:3000/media".to_string())
            .await
            .unwrap()
    }

    fn mp4_bytes(total: usize) -> Vec<u8> {
        let mut buf = vec![0x00, 0x00, 0x00, 0x18];
        buf.extend_from_slice(b"ftypmp42");
        buf.resize(total, 0);
        buf
    }

    #[tokio::test]
    async fn size_mismatch_deletes_the_quarantined_object() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;
        let key = "quarantine/short.pdf";
        storage
            .put(key, "application/pdf", b"%PDF-1.7".to_vec())
            .await
            .unwrap();

        let s = session(MediaKind::Visual, "application/pdf", 9999, key);
        let err = verify_quarantined_upload(&storage, &s, None)
            .await
            .unwrap_err();

        assert!(matches!(err.0, AppError::SizeMismatch { .. }));
        assert!(failure_is_terminal(&err));
        assert!(!storage.exists(key).await.unwrap());
    }

    #[tokio::test]
    async fn type_mismatch_deletes_the_quarantined_object() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;
        let key = "quarantine/forged.png";
        let data = b"%PDF-1.7 pretending to be a png".to_vec();
        storage
            .put(key, "image/png", data.clone())
            .await
            .unwrap();

        let s = session(MediaKind::Photo, "image/png", data.len() as i64, key);
        let err = verify_quarantined_upload(&storage, &s, None)
            .await
            .unwrap_err();

        assert!(matches!(err.0, AppError::TypeMismatch { .. }));
        assert!(failure_is_terminal(&err));
        assert!(!storage.exists(key).await.unwrap());
    }

    #[tokio::test]
    async fn missing_video_frame_leaves_the_object_in_quarantine() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;
        let key = "quarantine/clip.mp4";
        let data = mp4_bytes(2048);
        storage
            .put(key, "video/mp4", data.clone())
            .await
            .unwrap();

        let s = session(MediaKind::Video, "video/mp4", data.len() as i64, key);
        let err = verify_quarantined_upload(&storage, &s, None)
            .await
            .unwrap_err();

        // The object survives a recoverable failure so the caller can restore
        // the session and the client can retry with a frame attached.
        assert!(matches!(err.0, AppError::ThumbnailRequired));
        assert!(!failure_is_terminal(&err));
        assert!(storage.exists(key).await.unwrap());
    }

    #[tokio::test]
    async fn unuploaded_object_is_a_recoverable_failure() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;

        let s = session(MediaKind::Photo, "image/png", 100, "quarantine/absent.png");
        let err = verify_quarantined_upload(&storage, &s, None)
            .await
            .unwrap_err();

        assert!(matches!(err.0, AppError::FileNotUploaded));
        assert!(!failure_is_terminal(&err));
    }

    #[tokio::test]
    async fn pdf_passes_with_a_placeholder_thumbnail() {
        let dir = tempdir().unwrap();
        let storage = storage(&dir).await;
        let key = "quarantine/deck.pdf";
        let mut data = b"%PDF-1.7\n".to_vec();
        data.resize(4096, b' ');
        storage
            .put(key, "application/pdf", data.clone())
            .await
            .unwrap();

        let s = session(MediaKind::Visual, "application/pdf", data.len() as i64, key);
        let thumbnail = verify_quarantined_upload(&storage, &s, None).await.unwrap();

        assert!(!thumbnail.is_empty());
        // Verification leaves the original in quarantine; the caller moves it.
        assert!(storage.exists(key).await.unwrap());
    }

    #[test]
    fn integrity_failures_are_terminal() {
        assert!(failure_is_terminal(&AppError::EmptyFile.into()));
        assert!(failure_is_terminal(
            &AppError::SizeMismatch {
                declared: 100,
                actual: 50
            }
            .into()
        ));
        assert!(failure_is_terminal(
            &AppError::TypeMismatch {
                expected: "image/png".to_string(),
                detected: Some("image/jpeg".to_string()),
            }
            .into()
        ));
    }

    #[test]
    fn recoverable_failures_allow_a_retry() {
        // The blob is still in quarantine after these, so the session can be
        // restored and the same confirm replayed.
        assert!(!failure_is_terminal(&AppError::FileNotUploaded.into()));
        assert!(!failure_is_terminal(&AppError::ThumbnailRequired.into()));
        assert!(!failure_is_terminal(&AppError::InvalidThumbnail.into()));
        assert!(!failure_is_terminal(
            &AppError::Storage("copy failed".to_string()).into()
        ));
        assert!(!failure_is_terminal(
            &AppError::Internal("pool exhausted".to_string()).into()
        ));
    }
}

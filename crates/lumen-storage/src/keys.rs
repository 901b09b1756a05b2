//! Shared key generation for storage backends.
//!
//! All backends use the same key layout:
//!
//! - quarantine: `quarantine/{upload_id}.{ext}`
//! - original: `{events|projects}/{scope_id}/media/originals/{media_id}.{ext}`
//! - thumbnail: `{events|projects}/{scope_id}/media/thumbnails/{media_id}.webp`
//! - version original: `versions/{media_id}/{version_id}/original.{ext}`
//! - version thumbnail: `versions/{media_id}/{version_id}/thumb.webp`
//!
//! Version blobs are keyed by the version row's id, not its number: the
//! number is assigned inside the insert transaction, after the blobs are
//! already in place, and two in-flight versions must never share a key.

use std::time::Duration;

use lumen_core::models::MediaScope;
use uuid::Uuid;

/// Signed URL lifetime for thumbnails.
pub const THUMBNAIL_URL_EXPIRY: Duration = Duration::from_secs(60 * 60);
/// Signed URL lifetime for full-resolution originals.
pub const ORIGINAL_URL_EXPIRY: Duration = Duration::from_secs(5 * 60);
/// Signed URL lifetime for download links handed to anonymous token holders.
pub const DOWNLOAD_URL_EXPIRY: Duration = Duration::from_secs(10 * 60);

/// Extract a lowercase file extension, falling back to `bin` when the
/// filename has none. Only ASCII alphanumeric extensions are accepted; the
/// extension is the single piece of a user filename that reaches a storage
/// key, so it must not be able to smuggle in a path separator.
pub fn file_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(stem, ext)| (stem, ext.to_ascii_lowercase()))
        .filter(|(stem, ext)| {
            !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|(_, ext)| ext)
        .unwrap_or_else(|| "bin".to_string())
}

/// Key for an unverified upload awaiting confirmation.
pub fn quarantine_key(upload_id: Uuid, filename: &str) -> String {
    format!("quarantine/{}.{}", upload_id, file_extension(filename))
}

/// Key for the verified original of a media item.
pub fn original_key(scope: &MediaScope, media_id: Uuid, filename: &str) -> String {
    format!(
        "{}/{}/media/originals/{}.{}",
        scope.key_segment(),
        scope.id(),
        media_id,
        file_extension(filename)
    )
}

/// Key for the generated thumbnail of a media item. Always webp.
pub fn thumbnail_key(scope: &MediaScope, media_id: Uuid) -> String {
    format!(
        "{}/{}/media/thumbnails/{}.webp",
        scope.key_segment(),
        scope.id(),
        media_id
    )
}

/// Key for the original of one version of a media item.
pub fn version_original_key(media_id: Uuid, version_id: Uuid, filename: &str) -> String {
    format!(
        "versions/{}/{}/original.{}",
        media_id,
        version_id,
        file_extension(filename)
    )
}

/// Key for the thumbnail of one version of a media item.
pub fn version_thumbnail_key(media_id: Uuid, version_id: Uuid) -> String {
    format!("versions/{}/{}/thumb.webp", media_id, version_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_extraction() {
        assert_eq!(file_extension("photo.JPG"), "jpg");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("noext"), "bin");
        assert_eq!(file_extension(".hidden"), "bin");
        assert_eq!(file_extension("trailing."), "bin");
    }

    #[test]
    fn extension_rejects_non_alphanumeric() {
        assert_eq!(file_extension("a./x"), "bin");
        assert_eq!(file_extension("clip.m p4"), "bin");
        assert_eq!(file_extension("photo.jp\u{00e9}g"), "bin");
        assert_eq!(file_extension("report.p-df"), "bin");
        assert!(!quarantine_key(Uuid::new_v4(), "a./x").trim_start_matches("quarantine/").contains('/'));
    }

    #[test]
    fn key_layout() {
        let event_id = Uuid::new_v4();
        let media_id = Uuid::new_v4();
        let scope = MediaScope::Event(event_id);

        assert_eq!(
            original_key(&scope, media_id, "sunset.jpeg"),
            format!("events/{}/media/originals/{}.jpeg", event_id, media_id)
        );
        assert_eq!(
            thumbnail_key(&scope, media_id),
            format!("events/{}/media/thumbnails/{}.webp", event_id, media_id)
        );

        let project_scope = MediaScope::Project(event_id);
        assert!(thumbnail_key(&project_scope, media_id).starts_with("projects/"));
    }

    #[test]
    fn version_keys() {
        let media_id = Uuid::new_v4();
        let version_id = Uuid::new_v4();
        assert_eq!(
            version_original_key(media_id, version_id, "logo.pdf"),
            format!("versions/{}/{}/original.pdf", media_id, version_id)
        );
        assert_eq!(
            version_thumbnail_key(media_id, version_id),
            format!("versions/{}/{}/thumb.webp", media_id, version_id)
        );
    }

    #[test]
    fn version_keys_are_distinct_per_version_and_for_webp_originals() {
        let media_id = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        // Two in-flight versions never share keys, whatever numbers they end
        // up with.
        assert_ne!(
            version_original_key(media_id, a, "art.png"),
            version_original_key(media_id, b, "art.png")
        );

        // A webp original must not land on its own thumbnail key.
        assert_ne!(
            version_original_key(media_id, a, "art.webp"),
            version_thumbnail_key(media_id, a)
        );
    }

    #[test]
    fn quarantine_keys_are_upload_scoped() {
        let upload_id = Uuid::new_v4();
        assert_eq!(
            quarantine_key(upload_id, "clip.mov"),
            format!("quarantine/{}.mov", upload_id)
        );
    }
}

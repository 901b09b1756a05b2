//! ZIP packaging of approved originals.

use crate::error::HttpAppError;
use lumen_core::AppError;
use lumen_storage::Storage;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// Sanitize a filename for an archive entry to prevent path traversal.
/// Extracts only the base name (strips path components like `../`).
fn sanitize_entry_name(filename: &str, fallback: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

/// Pick an entry name not yet used in the archive. Users may submit several
/// files under the same name; the loser gets its media id spliced in before
/// the extension.
fn unique_entry_name(used: &mut HashSet<String>, filename: &str, media_id: Uuid) -> String {
    let name = sanitize_entry_name(filename, &format!("unnamed_{}", media_id));
    if used.insert(name.clone()) {
        return name;
    }

    let deduped = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, media_id, ext),
        _ => format!("{}_{}", name, media_id),
    };
    used.insert(deduped.clone());
    deduped
}

/// Archive filename derived from an event or project name. Anything outside
/// a conservative character set becomes `_`.
pub fn archive_filename(container_name: &str) -> String {
    let stem: String = container_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "media.zip".to_string()
    } else {
        format!("{}.zip", stem)
    }
}

/// Build a ZIP (Deflated) of the given objects in memory.
///
/// Each item is `(media_id, storage_key, original_filename)`. Entries are
/// fetched one at a time; the finished archive is returned as one buffer.
pub async fn create_zip_archive(
    storage: &dyn Storage,
    items: Vec<(Uuid, String, String)>,
) -> Result<Vec<u8>, HttpAppError> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let mut used_names = HashSet::new();
        for (media_id, storage_key, original_filename) in items {
            let data = storage.download(&storage_key).await?;

            let entry_name = unique_entry_name(&mut used_names, &original_filename, media_id);

            zip.start_file(&entry_name, options).map_err(|e| {
                AppError::Internal(format!("Failed to add archive entry {}: {}", entry_name, e))
            })?;
            zip.write_all(&data).map_err(|e| {
                AppError::Internal(format!("Failed to write archive entry {}: {}", entry_name, e))
            })?;
        }

        zip.finish()
            .map_err(|e| AppError::Internal(format!("Failed to finalize archive: {}", e)))?;
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_are_traversal_safe() {
        assert_eq!(
            sanitize_entry_name("../../etc/passwd", "fallback"),
            "passwd"
        );
        assert_eq!(sanitize_entry_name("../foo/bar.txt", "fallback"), "bar.txt");
        assert_eq!(
            sanitize_entry_name("document.pdf", "fallback"),
            "document.pdf"
        );
        assert_eq!(sanitize_entry_name("", "fallback"), "fallback");
        assert_eq!(sanitize_entry_name("..", "fallback"), "fallback");
        assert_eq!(sanitize_entry_name(".", "fallback"), "fallback");
    }

    #[test]
    fn duplicate_filenames_get_distinct_entries() {
        let mut used = HashSet::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert_eq!(unique_entry_name(&mut used, "photo.jpg", first), "photo.jpg");
        assert_eq!(
            unique_entry_name(&mut used, "photo.jpg", second),
            format!("photo_{}.jpg", second)
        );

        // No extension still gets a distinct name.
        assert_eq!(unique_entry_name(&mut used, "README", first), "README");
        assert_eq!(
            unique_entry_name(&mut used, "README", second),
            format!("README_{}", second)
        );
    }

    #[test]
    fn archive_filenames_are_header_safe() {
        assert_eq!(archive_filename("Summer Gala 2026"), "Summer_Gala_2026.zip");
        assert_eq!(archive_filename("démo; rm -rf /"), "d_mo__rm_-rf.zip");
        assert_eq!(archive_filename("   "), "media.zip");
        assert_eq!(archive_filename("launch-v2"), "launch-v2.zip");
    }
}

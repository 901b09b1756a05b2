//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// Callers work against fully formed storage keys; key layout lives in the
/// `keys` module so every backend sees the same structure.
///
/// Keys must not contain `..` or a leading `/`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write an object at the given key, replacing any previous content.
    async fn put(&self, storage_key: &str, content_type: &str, data: Vec<u8>)
        -> StorageResult<()>;

    /// Download an object by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Download at most `length` bytes starting at `offset`. An object
    /// shorter than the requested range returns whatever exists past
    /// `offset`; callers sniffing magic bytes must not pull whole objects
    /// through memory for it.
    async fn download_range(
        &self,
        storage_key: &str,
        offset: u64,
        length: u64,
    ) -> StorageResult<Vec<u8>>;

    /// Delete an object by its storage key. Deleting a missing object is not
    /// an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the size in bytes of an object. Returns `NotFound` if it does not
    /// exist.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Copy an object from one key to another, replacing the destination.
    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<()>;

    /// Generate a presigned PUT URL for direct uploads.
    ///
    /// Clients upload with HTTP PUT to the returned URL. Only supported by S3
    /// backends; other backends return a `ConfigError`.
    ///
    /// The URL does not constrain the uploaded content length or type; the
    /// confirm-time gates enforce both against the declared values.
    async fn presigned_put_url(
        &self,
        storage_key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Generate a presigned/temporary URL for direct read access (GET)
    ///
    /// This lets clients fetch objects without the bytes flowing through the
    /// application server.
    async fn presigned_get_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Move an object by copy-then-delete.
    ///
    /// The copy must succeed; a failed source delete is logged and swallowed.
    /// A dangling source object is preferable to losing the destination.
    async fn move_object(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        self.copy(from_key, to_key).await?;

        if let Err(e) = self.delete(from_key).await {
            tracing::warn!(
                error = %e,
                from_key = %from_key,
                to_key = %to_key,
                "Move completed but source delete failed"
            );
        }

        Ok(())
    }
}

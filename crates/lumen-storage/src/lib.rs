//! Lumen Storage Library
//!
//! Storage abstraction and implementations for Lumen. Provides the Storage
//! trait plus S3 and local filesystem backends.
//!
//! # Storage key layout
//!
//! All backends share the same key layout, generated by the `keys` module:
//!
//! - **Quarantine**: `quarantine/{upload_id}.{ext}` (unverified uploads)
//! - **Originals**: `{events|projects}/{scope_id}/media/originals/{media_id}.{ext}`
//! - **Thumbnails**: `{events|projects}/{scope_id}/media/thumbnails/{media_id}.webp`
//! - **Versions**: `versions/{media_id}/{version_id}/original.{ext}` plus
//!   `thumb.webp` alongside
//!
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{DOWNLOAD_URL_EXPIRY, ORIGINAL_URL_EXPIRY, THUMBNAIL_URL_EXPIRY};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use lumen_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};

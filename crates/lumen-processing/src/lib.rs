//! Lumen Processing Library
//!
//! Content verification and thumbnail generation for uploaded media. Nothing
//! in this crate touches storage or the database; callers feed it bytes.

pub mod thumbnail;
pub mod verifier;

pub use thumbnail::{
    generate_thumbnail, placeholder_thumbnail, thumbnail_from_data_url, ThumbnailError,
    THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH,
};
pub use verifier::{detect_content_type, verify_content_type, Verification, SNIFF_LENGTH};

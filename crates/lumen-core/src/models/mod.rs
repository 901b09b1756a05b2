//! Domain models shared across crates.

pub mod container;
pub mod media;
pub mod scope;
pub mod share_token;
pub mod upload;
pub mod user;

pub use container::{Event, EventStatus, Project};
pub use media::{Media, MediaKind, MediaStatus, MediaVersion, ReviewStatus, ScopeStats};
pub use scope::MediaScope;
pub use share_token::{ShareToken, TokenKind};
pub use upload::{
    ConfirmUploadRequest, ConfirmUploadResponse, ConfirmVersionRequest, ConfirmVersionResponse,
    SignUploadRequest, SignUploadResponse, SignVersionRequest, UploadSession,
};
pub use user::{User, UserRole, UserStatus};

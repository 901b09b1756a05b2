//! Database repositories for the data access layer
//!
//! Each repository owns the queries for one domain entity and returns clean
//! core models; the nullable scope columns never leak past this module.

pub mod container;
pub mod media;
pub mod share_token;
pub mod user;

pub use container::{EventRepository, ProjectRepository};
pub use media::{MediaRepository, NewMedia};
pub use share_token::ShareTokenRepository;
pub use user::UserRepository;

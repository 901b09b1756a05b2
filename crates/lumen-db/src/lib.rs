//! Lumen Database Library
//!
//! sqlx/Postgres repositories for media, versions, share tokens, events,
//! projects and users. Schema lives in the workspace `migrations/` directory
//! and is applied at startup by the API crate.

pub mod db;

pub use db::{
    EventRepository, MediaRepository, NewMedia, ProjectRepository, ShareTokenRepository,
    UserRepository,
};

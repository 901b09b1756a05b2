//! Domain services shared by multiple handlers.

pub mod archive;
pub mod ingest;
pub mod share_link;
pub mod upload_session;

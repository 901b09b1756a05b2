//! Session-token authentication for the protected route group.

pub mod middleware;

pub use middleware::{auth_middleware, AuthState, AuthUser};

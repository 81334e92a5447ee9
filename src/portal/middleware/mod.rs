// Middleware module - Axum middleware

pub mod auth;
pub mod cors;

pub use auth::{session_middleware, SessionContext};
pub use cors::cors_layer;

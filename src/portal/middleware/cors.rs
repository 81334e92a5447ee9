use axum::http::HeaderName;
use tower_http::cors::{Any, CorsLayer};

use super::auth::SESSION_TOKEN_HEADER;

/// Permissive CORS for the dashboard frontends; the rotated session token
/// header must be exposed so browser clients can pick it up.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_TOKEN_HEADER)])
}

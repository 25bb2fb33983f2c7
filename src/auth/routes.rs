//! Authentication routes

use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /api/auth/google/login` - Start the Google OAuth flow
/// - `GET /api/auth/google/callback` - Provider callback, issues the session token
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/google/login", get(handlers::google_login))
        .route("/api/auth/google/callback", get(handlers::google_callback))
}

//! User account routes

use axum::{
    routing::{get, patch},
    Router,
};

use super::handlers;

/// Creates and returns the user account router
///
/// All routes require a valid bearer session token.
///
/// # Routes
/// - `GET /api/users` - Paginated account list
/// - `GET /api/users/search` - Paginated name/email search
/// - `GET /api/users/stats` - Aggregate counts
/// - `GET /api/users/:id` - Single account
/// - `PUT /api/users/:id` - Update profile
/// - `PATCH /api/users/:id/activate` - Reactivate
/// - `PATCH /api/users/:id/deactivate` - Deactivate
/// - `DELETE /api/users/:id` - Soft delete
pub fn user_routes() -> Router {
    Router::new()
        .route("/api/users", get(handlers::get_users))
        .route("/api/users/search", get(handlers::search_users))
        .route("/api/users/stats", get(handlers::get_user_stats))
        .route(
            "/api/users/:id",
            get(handlers::get_user_by_id)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/api/users/:id/activate", patch(handlers::activate_user))
        .route(
            "/api/users/:id/deactivate",
            patch(handlers::deactivate_user),
        )
}

// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::service::AuthService;
use crate::auth::token::TokenService;
use crate::users::service::UserService;

/// Application state containing the database pool, services, and configuration.
///
/// Everything here is constructed once in `main` and immutable afterwards; the
/// signing key in particular lives inside `token_service` for the whole
/// process lifetime.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub token_service: Arc<TokenService>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
}

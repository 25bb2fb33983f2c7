//! Authentication handlers

use axum::extract::{Extension, Query};
use axum::response::Redirect;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::models::CallbackParams;
use crate::common::{ApiError, AppState};

/// GET /api/auth/google/login
///
/// Starts the Google OAuth flow. Issues a fresh anti-forgery state and
/// redirects the browser to Google's consent screen with a temporary (307)
/// redirect so the flow is not cached as permanent.
pub async fn google_login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();

    let auth_url = state.auth_service.start_login().await;

    info!("Starting Google OAuth flow");
    Ok(Redirect::temporary(&auth_url))
}

/// GET /api/auth/google/callback
///
/// Handles the provider callback. On success, responds with a see-other (303)
/// redirect to the frontend carrying the session token and profile fields as
/// query parameters.
pub async fn google_callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();

    if let Some(error) = params.error {
        warn!(oauth_error = %error, "Provider returned an error on callback");
        return Err(ApiError::BadRequest(format!(
            "provider denied authorization: {}",
            error
        )));
    }

    if params.code.is_empty() {
        return Err(ApiError::BadRequest(
            "missing authorization code".to_string(),
        ));
    }

    let target = state
        .auth_service
        .complete_login(&params.code, &params.state)
        .await?;

    Ok(Redirect::to(&target))
}

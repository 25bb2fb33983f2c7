//! User account handlers
//!
//! Every route here sits behind the bearer session guard; handlers receive
//! `AuthedClaims` purely to enforce it. Responses use the
//! `{"success": true, "data": ...}` envelope.

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{PageQuery, UpdateUserRequest};
use crate::auth::AuthedClaims;
use crate::common::{ApiError, AppState};

fn envelope(data: impl serde::Serialize) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "data": data,
    }))
}

/// GET /api/users - Paginated list of accounts
pub async fn get_users(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    _claims: AuthedClaims,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await.clone();

    let page = app_state.user_service.get_all(query.page, query.limit).await?;

    Ok(envelope(page))
}

/// GET /api/users/search?q= - Paginated name/email search
pub async fn search_users(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    _claims: AuthedClaims,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let keyword = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing search keyword".to_string()))?;

    let app_state = state.read().await.clone();

    let page = app_state
        .user_service
        .search(keyword, query.page, query.limit)
        .await?;

    Ok(envelope(page))
}

/// GET /api/users/stats - Aggregate account counts
pub async fn get_user_stats(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    _claims: AuthedClaims,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await.clone();

    let stats = app_state.user_service.stats().await?;

    Ok(envelope(stats))
}

/// GET /api/users/:id - Single account
pub async fn get_user_by_id(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    _claims: AuthedClaims,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await.clone();

    let user = app_state.user_service.get_by_id(user_id).await?;

    Ok(envelope(user))
}

/// PUT /api/users/:id - Update name/avatar
pub async fn update_user(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    _claims: AuthedClaims,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await.clone();

    let user = app_state
        .user_service
        .update_profile(user_id, request)
        .await?;

    Ok(envelope(user))
}

/// PATCH /api/users/:id/activate - Reactivate an account
pub async fn activate_user(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    _claims: AuthedClaims,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await.clone();

    let user = app_state.user_service.set_active(user_id, true).await?;

    Ok(envelope(user))
}

/// PATCH /api/users/:id/deactivate - Deactivate an account
pub async fn deactivate_user(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    _claims: AuthedClaims,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await.clone();

    let user = app_state.user_service.set_active(user_id, false).await?;

    Ok(envelope(user))
}

/// DELETE /api/users/:id - Soft delete
pub async fn delete_user(
    Extension(state): Extension<Arc<RwLock<AppState>>>,
    _claims: AuthedClaims,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let app_state = state.read().await.clone();

    app_state.user_service.soft_delete(user_id).await?;

    Ok(envelope(serde_json::json!({
        "message": "user deleted",
    })))
}

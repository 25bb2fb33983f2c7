//! User account data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user account row.
///
/// `deleted_at` implements soft delete: rows with it set are invisible to
/// every read path and never serialized back to clients.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub federated_id: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing)]
    pub deleted_at: Option<String>,
}

/// PUT /api/users/:id request body
#[derive(Deserialize, Debug, Clone)]
pub struct UpdateUserRequest {
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Pagination query parameters shared by list and search endpoints
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Search keyword, only meaningful on the search endpoint
    #[serde(default)]
    pub q: Option<String>,
}

/// One page of user accounts
#[derive(Serialize, Debug)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

/// Aggregate counts over non-deleted accounts
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
}

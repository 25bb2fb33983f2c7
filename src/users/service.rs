use sqlx::SqlitePool;
use tracing::info;

use super::models::{UpdateUserRequest, User, UserPage, UserStats};
use crate::auth::models::FederatedIdentity;
use crate::common::{safe_email_log, ApiError, Validator};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

const USER_COLUMNS: &str = "id, email, name, federated_id, avatar_url, is_active, \
     created_at, updated_at, deleted_at";

pub struct UserService {
    db: SqlitePool,
}

impl UserService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ============================================================================
    // Login flow
    // ============================================================================

    /// Find the account matching a federated identity, creating it if absent.
    ///
    /// Matches by email or provider subject among non-deleted rows, so a
    /// returning user keeps their id even if the provider starts omitting one
    /// of the two. Idempotent: logging in twice with the same identity yields
    /// the same row.
    pub async fn get_or_create(&self, identity: &FederatedIdentity) -> Result<User, sqlx::Error> {
        let email = identity.email.to_lowercase();
        let federated_id = identity.id.as_deref().unwrap_or("");

        let query = format!(
            "SELECT {} FROM users \
             WHERE deleted_at IS NULL \
               AND (email = ? OR (federated_id IS NOT NULL AND federated_id = ?))",
            USER_COLUMNS
        );
        let existing: Option<User> = sqlx::query_as::<_, User>(&query)
            .bind(&email)
            .bind(federated_id)
            .fetch_optional(&self.db)
            .await?;

        if let Some(user) = existing {
            return Ok(user);
        }

        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, name, federated_id, avatar_url, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&email)
        .bind(&identity.name)
        .bind(identity.id.as_deref())
        .bind(if identity.picture.is_empty() {
            None
        } else {
            Some(identity.picture.as_str())
        })
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await?;

        let id = result.last_insert_rowid();
        info!(
            user_id = id,
            email = %safe_email_log(&email),
            "Created new user account via federated login"
        );

        let query = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_one(&self.db)
            .await
    }

    // ============================================================================
    // User CRUD Operations
    // ============================================================================

    /// Get a user by id. Soft-deleted rows are treated as absent.
    pub async fn get_by_id(&self, id: i64) -> Result<User, ApiError> {
        let query = format!(
            "SELECT {} FROM users WHERE id = ? AND deleted_at IS NULL",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::NotFound("user not found".to_string()))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User, ApiError> {
        let query = format!(
            "SELECT {} FROM users WHERE email = ? AND deleted_at IS NULL",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(email.to_lowercase())
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::NotFound("user not found".to_string()))
    }

    /// Get one page of users, newest first.
    pub async fn get_all(&self, page: Option<i64>, limit: Option<i64>) -> Result<UserPage, ApiError> {
        let (page, limit) = normalize_pagination(page, limit);

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
                .fetch_one(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

        let query = format!(
            "SELECT {} FROM users WHERE deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind((page - 1) * limit)
            .fetch_all(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        Ok(UserPage {
            users,
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        })
    }

    /// Substring search over name and email, paginated like `get_all`.
    pub async fn search(
        &self,
        keyword: &str,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<UserPage, ApiError> {
        let (page, limit) = normalize_pagination(page, limit);
        let pattern = format!("%{}%", keyword);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users \
             WHERE deleted_at IS NULL AND (name LIKE ? OR email LIKE ?)",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        let query = format!(
            "SELECT {} FROM users \
             WHERE deleted_at IS NULL AND (name LIKE ? OR email LIKE ?) \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(&pattern)
            .bind(&pattern)
            .bind(limit)
            .bind((page - 1) * limit)
            .fetch_all(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        Ok(UserPage {
            users,
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        })
    }

    /// Update the mutable profile fields (name, avatar).
    pub async fn update_profile(
        &self,
        id: i64,
        request: UpdateUserRequest,
    ) -> Result<User, ApiError> {
        let validation_result = request.validate(&request);
        if !validation_result.is_valid {
            return Err(ApiError::from(validation_result));
        }

        self.get_by_id(id).await?;

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE users SET name = ?, avatar_url = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(request.name.trim())
        .bind(request.avatar_url.as_deref())
        .bind(&now)
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(user_id = id, "Updated user profile");

        self.get_by_id(id).await
    }

    pub async fn set_active(&self, id: i64, active: bool) -> Result<User, ApiError> {
        self.get_by_id(id).await?;

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE users SET is_active = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(active)
        .bind(&now)
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(user_id = id, active = active, "Changed user active flag");

        self.get_by_id(id).await
    }

    /// Soft delete: the row stays in the table with `deleted_at` set and
    /// disappears from every read path. The partial unique indexes free the
    /// email for a future signup.
    pub async fn soft_delete(&self, id: i64) -> Result<(), ApiError> {
        self.get_by_id(id).await?;

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE users SET deleted_at = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        info!(user_id = id, "Soft-deleted user account");

        Ok(())
    }

    pub async fn stats(&self) -> Result<UserStats, ApiError> {
        let (total_users, active_users): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(is_active), 0) \
             FROM users WHERE deleted_at IS NULL",
        )
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(UserStats {
            total_users,
            active_users,
            inactive_users: total_users - active_users,
        })
    }
}

fn normalize_pagination(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
    let limit = limit
        .filter(|l| *l >= 1)
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT);
    (page, limit)
}

fn total_pages(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

//! Tests for the users module
//!
//! These tests run against an in-memory SQLite database and cover:
//! - the get-or-create upsert used by the login flow
//! - pagination and search
//! - soft delete visibility
//! - profile validation

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    use crate::auth::models::FederatedIdentity;
    use crate::common::migrations::run_migrations;
    use crate::common::{ApiError, Validator};
    use crate::users::models::UpdateUserRequest;
    use crate::users::validators::is_valid_email;
    use crate::users::UserService;

    async fn setup_pool() -> SqlitePool {
        // Single connection so every query sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("failed to open in-memory database");
        run_migrations(&pool).await.expect("migrations failed");
        pool
    }

    fn identity(email: &str, subject: &str) -> FederatedIdentity {
        FederatedIdentity {
            id: Some(subject.to_string()),
            email: email.to_string(),
            name: "Test User".to_string(),
            picture: "https://example.com/p.png".to_string(),
            verified_email: true,
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let service = UserService::new(setup_pool().await);

        let first = service
            .get_or_create(&identity("alice@example.com", "sub-1"))
            .await
            .unwrap();
        let second = service
            .get_or_create(&identity("alice@example.com", "sub-1"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_users, 1);
    }

    #[tokio::test]
    async fn test_get_or_create_matches_by_federated_id() {
        let service = UserService::new(setup_pool().await);

        let first = service
            .get_or_create(&identity("alice@example.com", "sub-1"))
            .await
            .unwrap();

        // Same provider subject, different (aliased) email
        let second = service
            .get_or_create(&identity("alice.alias@example.com", "sub-1"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_get_or_create_lowercases_email() {
        let service = UserService::new(setup_pool().await);

        let user = service
            .get_or_create(&identity("Alice@Example.COM", "sub-1"))
            .await
            .unwrap();

        assert_eq!(user.email, "alice@example.com");
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn test_pagination_defaults_and_totals() {
        let service = UserService::new(setup_pool().await);

        for i in 0..25 {
            service
                .get_or_create(&identity(&format!("user{}@example.com", i), &format!("s{}", i)))
                .await
                .unwrap();
        }

        let page = service.get_all(Some(1), Some(10)).await.unwrap();
        assert_eq!(page.users.len(), 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);

        let last = service.get_all(Some(3), Some(10)).await.unwrap();
        assert_eq!(last.users.len(), 5);

        // Defaults: page=1, limit=10; limit capped at 100
        let defaulted = service.get_all(None, None).await.unwrap();
        assert_eq!(defaulted.page, 1);
        assert_eq!(defaulted.limit, 10);

        let capped = service.get_all(Some(1), Some(10_000)).await.unwrap();
        assert_eq!(capped.limit, 100);
    }

    #[tokio::test]
    async fn test_search_matches_name_and_email() {
        let service = UserService::new(setup_pool().await);

        service
            .get_or_create(&identity("carol@example.com", "s1"))
            .await
            .unwrap();
        service
            .get_or_create(&identity("dave@other.org", "s2"))
            .await
            .unwrap();

        let by_email = service.search("carol", None, None).await.unwrap();
        assert_eq!(by_email.total, 1);
        assert_eq!(by_email.users[0].email, "carol@example.com");

        let by_name = service.search("Test User", None, None).await.unwrap();
        assert_eq!(by_name.total, 2);

        let none = service.search("zzz-no-match", None, None).await.unwrap();
        assert_eq!(none.total, 0);
        assert_eq!(none.total_pages, 0);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_row_everywhere() {
        let service = UserService::new(setup_pool().await);

        let user = service
            .get_or_create(&identity("gone@example.com", "s1"))
            .await
            .unwrap();

        service.soft_delete(user.id).await.unwrap();

        assert!(matches!(
            service.get_by_id(user.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.get_by_email("gone@example.com").await,
            Err(ApiError::NotFound(_))
        ));

        let page = service.get_all(None, None).await.unwrap();
        assert_eq!(page.total, 0);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_users, 0);

        // Deleting again reports not found
        assert!(matches!(
            service.soft_delete(user.id).await,
            Err(ApiError::NotFound(_))
        ));

        // The email is free again: a new signup gets a fresh id
        let replacement = service
            .get_or_create(&identity("gone@example.com", "s2"))
            .await
            .unwrap();
        assert_ne!(replacement.id, user.id);
    }

    #[tokio::test]
    async fn test_activate_deactivate_and_stats() {
        let service = UserService::new(setup_pool().await);

        let a = service
            .get_or_create(&identity("a@example.com", "s1"))
            .await
            .unwrap();
        service
            .get_or_create(&identity("b@example.com", "s2"))
            .await
            .unwrap();

        let deactivated = service.set_active(a.id, false).await.unwrap();
        assert!(!deactivated.is_active);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_users, 1);
        assert_eq!(stats.inactive_users, 1);

        let reactivated = service.set_active(a.id, true).await.unwrap();
        assert!(reactivated.is_active);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let service = UserService::new(setup_pool().await);

        let user = service
            .get_or_create(&identity("edit@example.com", "s1"))
            .await
            .unwrap();

        let updated = service
            .update_profile(
                user.id,
                UpdateUserRequest {
                    name: "New Name".to_string(),
                    avatar_url: Some("https://example.com/new.png".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "New Name");
        assert_eq!(
            updated.avatar_url.as_deref(),
            Some("https://example.com/new.png")
        );

        let rejected = service
            .update_profile(
                user.id,
                UpdateUserRequest {
                    name: "   ".to_string(),
                    avatar_url: None,
                },
            )
            .await;
        assert!(matches!(rejected, Err(ApiError::ValidationError(_))));

        let missing = service
            .update_profile(
                9999,
                UpdateUserRequest {
                    name: "Anyone".to_string(),
                    avatar_url: None,
                },
            )
            .await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_update_request_validation() {
        let ok = UpdateUserRequest {
            name: "Fine".to_string(),
            avatar_url: Some("https://example.com/a.png".to_string()),
        };
        assert!(ok.validate(&ok).is_valid);

        let bad_avatar = UpdateUserRequest {
            name: "Fine".to_string(),
            avatar_url: Some("ftp://example.com/a.png".to_string()),
        };
        assert!(!bad_avatar.validate(&bad_avatar).is_valid);
    }

    #[test]
    fn test_email_shape_check() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}

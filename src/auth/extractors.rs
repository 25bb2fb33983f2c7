//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::token::Claims;
use crate::common::{safe_email_log, ApiError, AppState};

/// Authenticated session extractor
///
/// Validates the `Authorization: Bearer <token>` header against the RS256
/// public key and exposes the token claims. Verification is stateless: no
/// database lookup happens here, so a token stays valid until expiry even if
/// the account is deactivated or deleted afterwards.
#[derive(Debug)]
pub struct AuthedClaims(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthedClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let header = match header {
            Some(h) => h,
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized(
                    "missing authorization header".to_string(),
                ));
            }
        };

        let token = match header.strip_prefix("Bearer ") {
            Some(rest) if !rest.is_empty() => rest,
            _ => {
                warn!("Authentication failed: malformed Authorization header");
                return Err(ApiError::Unauthorized(
                    "malformed authorization header".to_string(),
                ));
            }
        };

        let claims = app_state.token_service.verify(token).map_err(|e| {
            warn!(error = %e, "Session token validation failed");
            ApiError::Unauthorized(e.to_string())
        })?;

        debug!(
            email = %safe_email_log(&claims.email),
            "Session token validated via extractor"
        );

        Ok(AuthedClaims(claims))
    }
}

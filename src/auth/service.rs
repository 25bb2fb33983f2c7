//! Login flow orchestration
//!
//! One login attempt walks: state issued -> provider redirect -> callback with
//! code+state -> identity resolved -> account upserted -> session token
//! issued. Any stage failure aborts the whole attempt; the account upsert is
//! the only write and is committed once when the identity resolves.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::google::{ExchangeError, IdentityProvider};
use super::state_store::StateStore;
use super::token::{TokenError, TokenService};
use crate::common::helpers::safe_token_log;
use crate::common::{safe_email_log, ApiError};
use crate::users::service::UserService;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("state parameter doesn't match")]
    StateMismatch,
    #[error("provider profile is unusable: {0}")]
    InvalidProfile(String),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::StateMismatch => ApiError::BadRequest(err.to_string()),
            LoginError::InvalidProfile(msg) => ApiError::Upstream(msg),
            LoginError::Exchange(ExchangeError::Network(msg)) => ApiError::UpstreamTimeout(msg),
            LoginError::Exchange(e) => ApiError::Upstream(e.to_string()),
            LoginError::Token(e) => ApiError::InternalServer(e.to_string()),
            LoginError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

/// Orchestrates the Google login flow. All collaborators are injected at
/// construction; nothing here is process-global.
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    tokens: Arc<TokenService>,
    users: Arc<UserService>,
    states: StateStore,
    frontend_redirect_url: String,
}

impl AuthService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        tokens: Arc<TokenService>,
        users: Arc<UserService>,
        frontend_redirect_url: String,
    ) -> Self {
        Self {
            provider,
            tokens,
            users,
            states: StateStore::new(),
            frontend_redirect_url,
        }
    }

    /// Begin a login attempt: issue a fresh anti-forgery state and build the
    /// provider redirect URL around it.
    pub async fn start_login(&self) -> String {
        let state = self.states.issue().await;
        self.provider.authorization_url(&state)
    }

    /// Complete a login attempt from the provider callback.
    ///
    /// The state is checked and consumed before any network call; a value
    /// that was never issued (or was already used) fails with
    /// [`LoginError::StateMismatch`] without contacting the provider.
    ///
    /// On success, returns the frontend redirect target carrying the signed
    /// session token and basic profile fields as query parameters.
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<String, LoginError> {
        if !self.states.consume(state).await {
            warn!("Login callback rejected: state parameter doesn't match");
            return Err(LoginError::StateMismatch);
        }

        let identity = self.provider.exchange_code(code).await?;

        if !crate::users::validators::is_valid_email(&identity.email) {
            return Err(LoginError::InvalidProfile(
                "profile email is missing or malformed".to_string(),
            ));
        }

        let user = self.users.get_or_create(&identity).await?;

        let (token, token_expiry) = self.tokens.issue(&user.email)?;

        info!(
            user_id = user.id,
            email = %safe_email_log(&user.email),
            token = %safe_token_log(&token),
            "Login completed, session token issued"
        );

        Ok(self.redirect_target(&identity, &token, token_expiry))
    }

    // The token and profile fields travel as query parameters for frontend
    // compatibility. Sensitive data in URLs ends up in proxy and browser
    // logs; a one-time exchange code would avoid that.
    fn redirect_target(
        &self,
        identity: &super::models::FederatedIdentity,
        token: &str,
        token_expiry: i64,
    ) -> String {
        let query = [
            ("email", identity.email.as_str()),
            ("name", identity.name.as_str()),
            ("picture", identity.picture.as_str()),
            (
                "verified_email",
                if identity.verified_email { "true" } else { "false" },
            ),
            ("token", token),
            ("token_expiry", &token_expiry.to_string()),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

        format!("{}?{}", self.frontend_redirect_url, query)
    }
}

//! Google OAuth code exchange and profile fetch
//!
//! Two outbound HTTPS calls per login: the authorization code is exchanged
//! for an access token, then the userinfo endpoint is fetched with it.
//! Single attempt, no retries; the caller surfaces the error.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use super::models::FederatedIdentity;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const DEFAULT_SCOPE_EMAIL: &str = "https://www.googleapis.com/auth/userinfo.email";
const DEFAULT_SCOPE_PROFILE: &str = "https://www.googleapis.com/auth/userinfo.profile";

/// Outbound provider calls carry a bounded timeout; past it they fail with
/// `ExchangeError::Network` rather than hang.
const PROVIDER_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("network error contacting provider: {0}")]
    Network(String),
    #[error("token exchange rejected by provider: {0}")]
    Rejected(String),
    #[error("failed to fetch user profile: {0}")]
    ProfileFetch(String),
    #[error("failed to decode user profile: {0}")]
    ProfileDecode(String),
}

/// Abstraction over the federated identity provider, so the login flow can be
/// exercised with a test double.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the provider redirect URL carrying the anti-forgery state.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for the federated identity.
    async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, ExchangeError>;
}

#[derive(Debug, Clone)]
pub struct GoogleOauthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
    pub userinfo_url: String,
}

impl GoogleOauthConfig {
    /// Load the provider configuration from environment variables.
    pub fn from_env() -> Self {
        let scopes = vec![
            env::var("GOOGLE_USERINFO_EMAIL").unwrap_or_else(|_| DEFAULT_SCOPE_EMAIL.to_string()),
            env::var("GOOGLE_USERINFO_PROFILE")
                .unwrap_or_else(|_| DEFAULT_SCOPE_PROFILE.to_string()),
        ];

        Self {
            client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redirect_url: env::var("GOOGLE_REDIRECT_URL").unwrap_or_default(),
            scopes,
            userinfo_url: env::var("GOOGLE_USERINFO")
                .unwrap_or_else(|_| DEFAULT_USERINFO_URL.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google implementation of the identity provider.
#[derive(Clone)]
pub struct GoogleOauth {
    config: GoogleOauthConfig,
    client: Client,
}

impl GoogleOauth {
    /// Fails if the HTTP client cannot be built; a client without the
    /// bounded timeout is not an acceptable fallback.
    pub fn new(config: GoogleOauthConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl IdentityProvider for GoogleOauth {
    fn authorization_url(&self, state: &str) -> String {
        let scope_param = self.config.scopes.join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(&scope_param),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, ExchangeError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for provider access token");

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Transport error during token exchange");
                ExchangeError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(status = %status, error = %body, "Provider rejected the token exchange");
            return Err(ExchangeError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ExchangeError::Rejected(e.to_string()))?;

        debug!("Fetching user profile from userinfo endpoint");

        let profile = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Transport error fetching user profile");
                ExchangeError::ProfileFetch(e.to_string())
            })?;

        let status = profile.status();
        if !status.is_success() {
            return Err(ExchangeError::ProfileFetch(format!("HTTP {}", status)));
        }

        let identity: FederatedIdentity = profile
            .json()
            .await
            .map_err(|e| ExchangeError::ProfileDecode(e.to_string()))?;

        Ok(identity)
    }
}

//! Authentication data models

use serde::Deserialize;

/// Profile returned by the identity provider's userinfo endpoint.
///
/// Transient: produced once per login attempt and consumed by the account
/// upsert, never stored as-is.
#[derive(Deserialize, Debug, Clone)]
pub struct FederatedIdentity {
    /// Provider-side subject identifier, stored as `federated_id`
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub verified_email: bool,
}

/// Query parameters delivered by the provider on the OAuth callback
#[derive(Deserialize, Debug)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: String,
    /// Set instead of `code` when the user denied the consent screen
    #[serde(default)]
    pub error: Option<String>,
}

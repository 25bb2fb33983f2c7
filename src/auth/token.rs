//! RS256 session token issuance and verification
//!
//! The signing key is loaded once at startup from a PEM file and owned here
//! for the process lifetime. Verification is a pure function of the token,
//! the public half of the key, and the current time; there is no revocation
//! mechanism, a compromised key requires rotation.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Session token lifetime: two hours from issuance.
const TOKEN_TTL_HOURS: i64 = 2;

/// Claims carried by a session token
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),
    #[error("malformed token")]
    MalformedToken,
    #[error("invalid token signature")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
}

/// Issues and verifies RS256-signed session tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Build a token service from a PEM-encoded RSA private key
    /// (PKCS#8 or PKCS#1). The public half is derived from the private key.
    pub fn from_pem(pem: &[u8]) -> Result<Self, TokenError> {
        let private_key = decode_private_key(pem)?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| TokenError::KeyUnavailable(e.to_string()))?;
        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| TokenError::KeyUnavailable(e.to_string()))?;

        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| TokenError::KeyUnavailable(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| TokenError::KeyUnavailable(e.to_string()))?;

        Ok(Self {
            encoding_key,
            decoding_key,
        })
    }

    /// Build a token service from a PEM file on disk.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, TokenError> {
        let pem = std::fs::read(path.as_ref()).map_err(|e| {
            TokenError::KeyUnavailable(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_pem(&pem)
    }

    /// Issue a session token for the given subject email.
    ///
    /// Returns the signed token together with its expiry as a unix timestamp.
    pub fn issue(&self, subject_email: &str) -> Result<(String, i64), TokenError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(TOKEN_TTL_HOURS);

        let claims = Claims {
            email: subject_email.to_string(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::KeyUnavailable(e.to_string()))?;

        Ok((token, expires_at.timestamp()))
    }

    /// Verify a session token and return its claims.
    ///
    /// The algorithm is pinned to RS256: a token whose header claims any other
    /// scheme (including "none" or a symmetric algorithm) is rejected even if
    /// its claims are well-formed. Expiry is checked with zero leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => TokenError::SignatureInvalid,
                _ => TokenError::MalformedToken,
            }
        })?;

        Ok(data.claims)
    }
}

fn decode_private_key(pem: &[u8]) -> Result<RsaPrivateKey, TokenError> {
    let s = std::str::from_utf8(pem)
        .map_err(|_| TokenError::KeyUnavailable("key file is not valid UTF-8".to_string()))?;

    if let Ok(k) = RsaPrivateKey::from_pkcs8_pem(s) {
        return Ok(k);
    }
    if let Ok(k) = RsaPrivateKey::from_pkcs1_pem(s) {
        return Ok(k);
    }

    Err(TokenError::KeyUnavailable(
        "failed to parse RSA private key from PEM".to_string(),
    ))
}

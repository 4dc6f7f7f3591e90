//! Service account JWT signing.
//!
//! Uses `jsonwebtoken` for PS256 signatures. The assertion is single-purpose:
//! it is minted right before each exchange and never cached.

use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::credential::ServiceAccountKey;
use crate::errors::AuthError;
use crate::exchange::IAM_TOKEN_URL;

/// Default assertion validity (`exp - iat`).
pub const DEFAULT_ASSERTION_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// JWT claims accepted by the IAM token endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Issuer (service account ID).
    pub iss: String,
    /// Audience (IAM token endpoint URL).
    pub aud: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expires at (Unix timestamp).
    pub exp: i64,
}

/// Mints PS256 assertions for one service account key.
///
/// The private key is decoded once, at construction.
#[derive(Clone)]
pub struct TokenSigner {
    key_id: String,
    service_account_id: String,
    encoding_key: EncodingKey,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key_id", &self.key_id)
            .field("service_account_id", &self.service_account_id)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Decode the key's PEM private key.
    ///
    /// Fails with [`AuthError::KeyFormat`] when no PEM block is present or
    /// the key is not an RSA private key.
    pub fn new(key: &ServiceAccountKey) -> Result<Self, AuthError> {
        let pem = pem_block(key.private_key.expose_secret())?;
        let encoding_key =
            EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| AuthError::KeyFormat {
                reason: e.to_string(),
            })?;

        Ok(Self {
            key_id: key.id.clone(),
            service_account_id: key.service_account_id.clone(),
            encoding_key,
            lifetime: DEFAULT_ASSERTION_LIFETIME,
        })
    }

    /// Override the assertion lifetime.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Key identifier placed in the `kid` header.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Mint a fresh signed assertion.
    pub fn sign(&self) -> Result<String, AuthError> {
        let lifetime = i64::try_from(self.lifetime.as_secs()).map_err(|e| AuthError::Signing {
            reason: format!("assertion lifetime out of range: {e}"),
        })?;

        let mut header = Header::new(Algorithm::PS256);
        header.kid = Some(self.key_id.clone());

        let iat = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: self.service_account_id.clone(),
            aud: IAM_TOKEN_URL.to_string(),
            iat,
            exp: iat + lifetime,
        };

        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            AuthError::Signing {
                reason: e.to_string(),
            }
        })
    }
}

/// Decode the key and mint one assertion.
pub fn sign(key: &ServiceAccountKey) -> Result<String, AuthError> {
    TokenSigner::new(key)?.sign()
}

/// Slice off anything before the PEM armor; Yandex key files start with a
/// comment line.
fn pem_block(text: &str) -> Result<&str, AuthError> {
    text.find("-----BEGIN ")
        .map(|start| &text[start..])
        .ok_or_else(|| AuthError::KeyFormat {
            reason: "no PEM block found".to_string(),
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Cached IAM token with on-demand refresh.
//!
//! [`TokenManager`] owns the current [`AccessToken`] for one exchangeable
//! credential. Callers ask for a token with [`TokenManager::get_token`]; the
//! manager serves the cached value while it is fresh and performs exactly one
//! exchange once it enters the refresh margin. There is no background task:
//! refresh happens inside the call that observes a stale token.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::credential::ServiceAccountKey;
use crate::errors::AuthError;
use crate::exchange::TokenExchange;
use crate::signer::TokenSigner;
use crate::token::AccessToken;

/// Tokens expiring within this window are refreshed before use.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Grant used to obtain a new IAM token.
enum ExchangeGrant {
    /// Sign a fresh assertion and trade it.
    ServiceAccount(TokenSigner),
    /// Trade a Passport OAuth token.
    OAuth(SecretString),
}

impl ExchangeGrant {
    fn method(&self) -> &'static str {
        match self {
            Self::ServiceAccount(_) => "service_account",
            Self::OAuth(_) => "oauth",
        }
    }
}

/// Caches one IAM token and refreshes it when it nears expiry.
///
/// Safe to share behind an [`Arc`]. Concurrent callers that find the token
/// stale wait for a single in-flight exchange and all observe its result.
pub struct TokenManager {
    grant: ExchangeGrant,
    exchanger: Arc<dyn TokenExchange>,
    refresh_margin: Duration,
    current: RwLock<Option<AccessToken>>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("method", &self.grant.method())
            .field("refresh_margin", &self.refresh_margin)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Manager that signs assertions with a service account key.
    ///
    /// The private key is decoded here, so a malformed key fails at startup
    /// rather than on the first request.
    pub fn for_service_account(
        key: &ServiceAccountKey,
        exchanger: Arc<dyn TokenExchange>,
    ) -> Result<Self, AuthError> {
        let signer = TokenSigner::new(key)?;
        debug!(key_id = signer.key_id(), "service account signer ready");
        Ok(Self::with_grant(ExchangeGrant::ServiceAccount(signer), exchanger))
    }

    /// Manager that trades a Passport OAuth token.
    pub fn for_oauth(oauth_token: SecretString, exchanger: Arc<dyn TokenExchange>) -> Self {
        Self::with_grant(ExchangeGrant::OAuth(oauth_token), exchanger)
    }

    fn with_grant(grant: ExchangeGrant, exchanger: Arc<dyn TokenExchange>) -> Self {
        Self {
            grant,
            exchanger,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
            current: RwLock::new(None),
        }
    }

    /// Override the refresh margin.
    #[must_use]
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Override the lifetime of signed assertions. No effect for OAuth.
    #[must_use]
    pub fn with_assertion_lifetime(mut self, lifetime: Duration) -> Self {
        self.grant = match self.grant {
            ExchangeGrant::ServiceAccount(signer) => {
                ExchangeGrant::ServiceAccount(signer.with_lifetime(lifetime))
            }
            other => other,
        };
        self
    }

    /// Short name of the grant for logs and metrics.
    pub fn method(&self) -> &'static str {
        self.grant.method()
    }

    /// Return a token valid for longer than the refresh margin.
    ///
    /// Refreshes first when the cached token is missing or stale. A failed
    /// refresh leaves the cache untouched and returns the error.
    pub async fn get_token(&self) -> Result<String, AuthError> {
        {
            let current = self.current.read().await;
            if let Some(token) = self.fresh(current.as_ref()) {
                return Ok(token.expose().to_string());
            }
        }

        let mut current = self.current.write().await;
        // Double-check after acquiring write lock
        if let Some(token) = self.fresh(current.as_ref()) {
            return Ok(token.expose().to_string());
        }

        let token = self.refresh().await?;
        let value = token.expose().to_string();
        *current = Some(token);
        Ok(value)
    }

    fn fresh<'a>(&self, token: Option<&'a AccessToken>) -> Option<&'a AccessToken> {
        token.filter(|t| t.is_fresh(self.refresh_margin))
    }

    #[tracing::instrument(skip_all, fields(method = self.grant.method()))]
    async fn refresh(&self) -> Result<AccessToken, AuthError> {
        let method = self.grant.method();
        let result = match &self.grant {
            ExchangeGrant::ServiceAccount(signer) => match signer.sign() {
                Ok(assertion) => self.exchanger.exchange_service_account(&assertion).await,
                Err(e) => Err(e),
            },
            ExchangeGrant::OAuth(oauth_token) => {
                self.exchanger
                    .exchange_oauth(oauth_token.expose_secret())
                    .await
            }
        };

        match result {
            Ok(token) => {
                metrics::counter!("auth_refresh_total", "method" => method, "status" => "success")
                    .increment(1);
                info!(expires_at = %token.expires_at(), "IAM token refreshed");
                Ok(token)
            }
            Err(e) => {
                metrics::counter!("auth_refresh_total", "method" => method, "status" => "failure")
                    .increment(1);
                warn!(error = %e, "IAM token refresh failed");
                Err(e)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

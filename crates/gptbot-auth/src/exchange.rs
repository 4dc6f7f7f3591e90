//! IAM token exchange.
//!
//! Trades a signed service-account assertion or a Yandex Passport OAuth token
//! for a short-lived IAM token. Failures are surfaced as-is; nothing here
//! retries.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AuthError;
use crate::token::AccessToken;

/// Yandex Cloud IAM token endpoint.
pub const IAM_TOKEN_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";

/// Request timeout for token exchanges.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Exchanges long-lived credentials for IAM tokens.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange a signed service-account JWT.
    async fn exchange_service_account(&self, assertion: &str) -> Result<AccessToken, AuthError>;

    /// Exchange a Yandex Passport OAuth token.
    async fn exchange_oauth(&self, oauth_token: &str) -> Result<AccessToken, AuthError>;
}

#[derive(Serialize)]
struct JwtExchangeRequest<'a> {
    jwt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OAuthExchangeRequest<'a> {
    yandex_passport_oauth_token: &'a str,
}

/// IAM token endpoint response.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IamTokenResponse {
    iam_token: String,
    expires_at: DateTime<Utc>,
}

/// [`TokenExchange`] backed by the Yandex Cloud IAM HTTP API.
#[derive(Clone, Debug)]
pub struct IamExchanger {
    client: reqwest::Client,
    endpoint: String,
}

impl IamExchanger {
    /// Create an exchanger for the production endpoint.
    pub fn new() -> Result<Self, AuthError> {
        Self::with_timeout(EXCHANGE_TIMEOUT)
    }

    /// Create an exchanger whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Create an exchanger using a shared HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: IAM_TOKEN_URL.to_string(),
        }
    }

    /// Point the exchanger at a different endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn post<B>(&self, body: &B) -> Result<AccessToken, AuthError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let resp = self.client.post(&self.endpoint).json(body).send().await?;

        let status = resp.status().as_u16();
        let text = resp.text().await?;
        if status != 200 {
            tracing::warn!(status, body = %text, "IAM token exchange rejected");
            return Err(AuthError::AuthApi { status, body: text });
        }

        let data: IamTokenResponse = serde_json::from_str(&text).map_err(AuthError::Decode)?;
        Ok(AccessToken::new(data.iam_token, data.expires_at))
    }
}

#[async_trait]
impl TokenExchange for IamExchanger {
    #[tracing::instrument(skip_all, fields(grant = "jwt"))]
    async fn exchange_service_account(&self, assertion: &str) -> Result<AccessToken, AuthError> {
        self.post(&JwtExchangeRequest { jwt: assertion }).await
    }

    #[tracing::instrument(skip_all, fields(grant = "oauth"))]
    async fn exchange_oauth(&self, oauth_token: &str) -> Result<AccessToken, AuthError> {
        self.post(&OAuthExchangeRequest {
            yandex_passport_oauth_token: oauth_token,
        })
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

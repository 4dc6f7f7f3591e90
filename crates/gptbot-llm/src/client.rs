//! `YandexGPT` completion client.

use std::sync::Arc;

use gptbot_auth::{AuthError, Credential, IamExchanger, TokenExchange, TokenManager};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::errors::CompletionError;
use crate::types::{CompletionOptions, CompletionRequest, CompletionResponse};

/// Foundation Models completion endpoint.
pub const COMPLETION_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "yandexgpt-lite";

/// Where the bearer value for completion calls comes from.
#[derive(Clone)]
pub enum Authorization {
    /// Pre-issued token used verbatim.
    Static(SecretString),
    /// IAM token obtained and refreshed by a [`TokenManager`].
    Managed(Arc<TokenManager>),
}

impl Authorization {
    /// Resolve a credential, wiring exchangeable ones to a [`TokenManager`].
    ///
    /// Fails with [`AuthError::NotConfigured`] when the credential carries no
    /// secret material.
    pub fn from_credential(
        credential: Credential,
        exchanger: Arc<dyn TokenExchange>,
    ) -> Result<Self, AuthError> {
        if !credential.is_usable() {
            return Err(AuthError::NotConfigured(format!(
                "{} credential is empty",
                credential.method()
            )));
        }
        Ok(match credential {
            Credential::StaticToken(token) => Self::Static(token),
            Credential::ServiceAccount(key) => Self::Managed(Arc::new(
                TokenManager::for_service_account(&key, exchanger)?,
            )),
            Credential::OAuth(token) => {
                Self::Managed(Arc::new(TokenManager::for_oauth(token, exchanger)))
            }
        })
    }

    /// Short name of the method for logs.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Static(_) => "static_token",
            Self::Managed(manager) => manager.method(),
        }
    }

    async fn bearer(&self) -> Result<String, AuthError> {
        match self {
            Self::Static(token) => {
                let token = token.expose_secret();
                if token.is_empty() {
                    return Err(AuthError::NotConfigured("static token is empty".to_string()));
                }
                Ok(token.to_string())
            }
            Self::Managed(manager) => manager.get_token().await,
        }
    }
}

impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static([REDACTED])"),
            Self::Managed(manager) => f.debug_tuple("Managed").field(manager).finish(),
        }
    }
}

/// Sends single-message completion requests for one catalog.
#[derive(Clone, Debug)]
pub struct CompletionClient {
    client: reqwest::Client,
    authorization: Authorization,
    catalog_id: String,
    model: String,
    options: CompletionOptions,
    endpoint: String,
}

impl CompletionClient {
    /// Create a client with default model and generation options.
    pub fn new(
        authorization: Authorization,
        catalog_id: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            authorization,
            catalog_id: catalog_id.into(),
            model: DEFAULT_MODEL.to_string(),
            options: CompletionOptions::default(),
            endpoint: COMPLETION_URL.to_string(),
        })
    }

    /// Create a client from a raw credential, exchanging against the
    /// production IAM endpoint when needed.
    pub fn from_credential(
        credential: Credential,
        catalog_id: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        let exchanger: Arc<dyn TokenExchange> = Arc::new(IamExchanger::new()?);
        let authorization = Authorization::from_credential(credential, exchanger)?;
        Self::new(authorization, catalog_id)
    }

    /// Use a different model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.options.temperature = temperature;
        self
    }

    /// Override the generated token limit.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = max_tokens;
        self
    }

    /// Point the client at a different endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// `gpt://<catalog>/<model>`.
    pub fn model_uri(&self) -> String {
        format!("gpt://{}/{}", self.catalog_id, self.model)
    }

    /// Authentication in use.
    pub fn authorization(&self) -> &Authorization {
        &self.authorization
    }

    /// Send `text` as a single user message and return the first
    /// alternative's text.
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    pub async fn send_message(&self, text: &str) -> Result<String, CompletionError> {
        let result = self.complete(text).await;
        match &result {
            Ok(_) => {
                metrics::counter!("completion_requests_total", "status" => "success").increment(1);
            }
            Err(e) => {
                metrics::counter!("completion_requests_total", "status" => e.kind()).increment(1);
            }
        }
        result
    }

    async fn complete(&self, text: &str) -> Result<String, CompletionError> {
        let token = self.authorization.bearer().await?;
        let request = CompletionRequest::single_user_message(self.model_uri(), self.options, text);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if status != 200 {
            warn!(status, body = %body, "completion request rejected");
            return Err(CompletionError::Api { status, body });
        }

        let response: CompletionResponse =
            serde_json::from_str(&body).map_err(CompletionError::Decode)?;
        let first = response
            .result
            .alternatives
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?;
        debug!(status = %first.status, chars = first.message.text.len(), "completion received");
        Ok(first.message.text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

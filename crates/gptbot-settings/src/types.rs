//! Settings types.

use std::path::PathBuf;

use secrecy::SecretString;

/// Reply prefix used when generation fails and `GPTBOT_FALLBACK_MESSAGE` is unset.
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "Sorry, something went wrong while processing your message. Your message:";

/// Root settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Chat transport.
    pub telegram: TelegramSettings,
    /// Completion API.
    pub yandex: YandexSettings,
    /// Log output.
    pub logging: LoggingSettings,
    /// Relay behavior.
    pub relay: RelaySettings,
}

/// Chat transport settings.
#[derive(Debug, Clone)]
pub struct TelegramSettings {
    /// Bot API token.
    pub bot_token: SecretString,
}

/// Completion API settings.
#[derive(Debug, Clone)]
pub struct YandexSettings {
    /// Catalog (folder) the model is billed to.
    pub catalog_id: String,
    /// Authentication method and its secret.
    pub auth: AuthSettings,
    /// Model name in the model URI. `None` keeps the client default.
    pub model: Option<String>,
    /// Sampling temperature, `0.0..=1.0`. `None` keeps the client default.
    pub temperature: Option<f64>,
    /// Upper bound on generated tokens. `None` keeps the client default.
    pub max_tokens: Option<u32>,
}

/// Authentication method selected by `YANDEX_AUTH_TYPE`.
#[derive(Debug, Clone)]
pub enum AuthSettings {
    /// `static_token`: `YANDEX_CLOUD_TOKEN` used verbatim.
    StaticToken(SecretString),
    /// `service_account`: authorized key exchanged for IAM tokens.
    ServiceAccount(KeySource),
    /// `oauth`: `YANDEX_OAUTH_TOKEN` exchanged for IAM tokens.
    OAuth(SecretString),
}

impl AuthSettings {
    /// Name as written in `YANDEX_AUTH_TYPE`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StaticToken(_) => "static_token",
            Self::ServiceAccount(_) => "service_account",
            Self::OAuth(_) => "oauth",
        }
    }
}

/// Where the service account key JSON comes from.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// `YANDEX_SERVICE_ACCOUNT_KEY_FILE`.
    File(PathBuf),
    /// `YANDEX_SERVICE_ACCOUNT_KEY_JSON`.
    Json(SecretString),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Log output settings.
#[derive(Debug, Clone, Default)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,
}

/// Relay settings.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Prefix of the reply sent when generation fails.
    pub fallback_message: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

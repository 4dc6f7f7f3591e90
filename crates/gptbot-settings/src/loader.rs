//! Settings loading from environment variables.
//!
//! Loading flow:
//! 1. Start with compiled defaults for optional values
//! 2. Read required values; a missing one is an error
//! 3. Apply optional overrides (model, generation options, log format, fallback text)
//!
//! Variables are read through a lookup function so tests can supply a map
//! instead of touching the process environment. Empty values count as unset.

use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{
    AuthSettings, KeySource, LogFormat, LoggingSettings, RelaySettings, Settings,
    TelegramSettings, YandexSettings,
};

/// Load settings from the process environment.
pub fn load_settings() -> Result<Settings> {
    load_settings_with(|key| std::env::var(key).ok())
}

/// Load settings from an arbitrary variable lookup.
pub fn load_settings_with<F>(lookup: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let env = Env(lookup);

    let telegram = TelegramSettings {
        bot_token: SecretString::from(env.required("TELEGRAM_BOT_TOKEN")?),
    };

    let auth = read_auth(&env)?;
    debug!(auth_type = auth.name(), "selected auth method");

    let yandex = YandexSettings {
        catalog_id: env.required("YANDEX_CLOUD_CATALOG_ID")?,
        auth,
        model: env.string("YANDEX_GPT_MODEL"),
        temperature: env.parsed(
            "YANDEX_GPT_TEMPERATURE",
            |v: &f64| (0.0..=1.0).contains(v),
            "must be within 0.0..=1.0",
        )?,
        max_tokens: env.parsed("YANDEX_GPT_MAX_TOKENS", |v: &u32| *v > 0, "must be positive")?,
    };

    let logging = LoggingSettings {
        format: read_log_format(&env)?,
    };

    let relay = env
        .string("GPTBOT_FALLBACK_MESSAGE")
        .map_or_else(RelaySettings::default, |fallback_message| RelaySettings {
            fallback_message,
        });

    Ok(Settings {
        telegram,
        yandex,
        logging,
        relay,
    })
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        load_settings()
    }
}

fn read_auth<F>(env: &Env<F>) -> Result<AuthSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let auth_type = env
        .string("YANDEX_AUTH_TYPE")
        .unwrap_or_else(|| "static_token".to_string());

    match auth_type.as_str() {
        "static_token" => Ok(AuthSettings::StaticToken(SecretString::from(
            env.required("YANDEX_CLOUD_TOKEN")?,
        ))),
        "service_account" => {
            // Inline JSON wins over a file path.
            if let Some(json) = env.string("YANDEX_SERVICE_ACCOUNT_KEY_JSON") {
                Ok(AuthSettings::ServiceAccount(KeySource::Json(SecretString::from(json))))
            } else if let Some(path) = env.string("YANDEX_SERVICE_ACCOUNT_KEY_FILE") {
                Ok(AuthSettings::ServiceAccount(KeySource::File(PathBuf::from(path))))
            } else {
                Err(SettingsError::Missing(
                    "YANDEX_SERVICE_ACCOUNT_KEY_FILE or YANDEX_SERVICE_ACCOUNT_KEY_JSON",
                ))
            }
        }
        "oauth" => Ok(AuthSettings::OAuth(SecretString::from(
            env.required("YANDEX_OAUTH_TOKEN")?,
        ))),
        _ => Err(SettingsError::UnknownAuthType(auth_type)),
    }
}

fn read_log_format<F>(env: &Env<F>) -> Result<LogFormat>
where
    F: Fn(&str) -> Option<String>,
{
    match env.string("GPTBOT_LOG_FORMAT").as_deref() {
        None | Some("pretty") => Ok(LogFormat::Pretty),
        Some("json") => Ok(LogFormat::Json),
        Some(other) => Err(SettingsError::InvalidValue {
            key: "GPTBOT_LOG_FORMAT",
            value: other.to_string(),
            reason: "expected pretty or json".to_string(),
        }),
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String> {
        self.string(key).ok_or(SettingsError::Missing(key))
    }

    fn parsed<T>(
        &self,
        key: &'static str,
        valid: impl Fn(&T) -> bool,
        constraint: &str,
    ) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.string(key) else {
            return Ok(None);
        };
        let value = raw
            .trim()
            .parse::<T>()
            .map_err(|e| SettingsError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        if !valid(&value) {
            return Err(SettingsError::InvalidValue {
                key,
                value: raw,
                reason: constraint.to_string(),
            });
        }
        Ok(Some(value))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

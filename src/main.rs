//! # gptbot
//!
//! Telegram to `YandexGPT` relay binary. Wires settings, logging, the
//! completion client and the Telegram transport together and runs the relay
//! until Ctrl-C.

#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gptbot_auth::{Credential, ServiceAccountKey};
use gptbot_bot::{Relay, TelegramTransport};
use gptbot_llm::CompletionClient;
use gptbot_settings::{AuthSettings, KeySource, LogFormat, Settings};
use gptbot_telemetry::TelemetryConfig;
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;
use tracing::Level;

/// Telegram to `YandexGPT` relay bot.
#[derive(Parser, Debug)]
#[command(name = "gptbot", about = "Telegram to YandexGPT relay bot")]
struct Cli {
    /// Default log level (`RUST_LOG` takes precedence).
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit JSON logs regardless of `GPTBOT_LOG_FORMAT`.
    #[arg(long)]
    json_logs: bool,
}

/// Load the secret material for the configured auth method.
fn build_credential(auth: &AuthSettings) -> Result<Credential> {
    Ok(match auth {
        AuthSettings::StaticToken(token) => Credential::StaticToken(token.clone()),
        AuthSettings::ServiceAccount(KeySource::File(path)) => Credential::ServiceAccount(
            ServiceAccountKey::from_file(path).context("Failed to load service account key")?,
        ),
        AuthSettings::ServiceAccount(KeySource::Json(json)) => Credential::ServiceAccount(
            ServiceAccountKey::from_json(json.expose_secret())
                .context("Failed to parse service account key")?,
        ),
        AuthSettings::OAuth(token) => Credential::OAuth(token.clone()),
    })
}

fn build_client(settings: &Settings) -> Result<CompletionClient> {
    let credential = build_credential(&settings.yandex.auth)?;
    let mut client =
        CompletionClient::from_credential(credential, settings.yandex.catalog_id.clone())
            .context("Failed to create completion client")?;
    if let Some(model) = &settings.yandex.model {
        client = client.with_model(model.clone());
    }
    if let Some(temperature) = settings.yandex.temperature {
        client = client.with_temperature(temperature);
    }
    if let Some(max_tokens) = settings.yandex.max_tokens {
        client = client.with_max_tokens(max_tokens);
    }
    Ok(client)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = Settings::from_env().context("Invalid configuration")?;

    gptbot_telemetry::init_telemetry(&TelemetryConfig {
        log_level: args.log_level,
        module_levels: Vec::new(),
        json: args.json_logs || settings.logging.format == LogFormat::Json,
    })
    .context("Failed to initialize logging")?;

    let client = build_client(&settings)?;
    tracing::info!(
        auth_type = settings.yandex.auth.name(),
        model_uri = %client.model_uri(),
        "Starting gptbot"
    );

    let transport = TelegramTransport::new(settings.telegram.bot_token.clone())
        .context("Failed to create Telegram transport")?;
    let me = transport
        .get_me()
        .await
        .context("Failed to authorize Telegram bot")?;
    tracing::info!(
        username = me.username.as_deref().unwrap_or(&me.first_name),
        "Authorized on Telegram"
    );

    let relay = Relay::new(
        Arc::new(transport),
        Arc::new(client),
        settings.relay.fallback_message.clone(),
    );

    // Wait for shutdown signal
    let shutdown = CancellationToken::new();
    let _signal = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl+c");
            }
            tracing::info!("Shutting down");
            shutdown.cancel();
        }
    });

    relay.run(shutdown).await;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! # gptbot-settings
//!
//! Relay configuration read from environment variables.
//!
//! Optional values fall back to compiled defaults; required values
//! (`TELEGRAM_BOT_TOKEN`, `YANDEX_CLOUD_CATALOG_ID` and the secret for the
//! selected `YANDEX_AUTH_TYPE`) produce a [`SettingsError`] when unset.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::SettingsError;
pub use loader::{load_settings, load_settings_with};
pub use types::{AuthSettings, KeySource, LogFormat, Settings};

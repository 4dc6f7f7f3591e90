//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required environment variable is unset or empty.
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    /// `YANDEX_AUTH_TYPE` names no known method.
    #[error("unknown auth type {0:?} (expected static_token, service_account or oauth)")]
    UnknownAuthType(String),
    /// A settings value could not be parsed or is out of range.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Environment variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

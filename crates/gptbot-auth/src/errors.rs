//! Auth error types.

/// Errors that can occur while obtaining an IAM token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The private key is not a decodable PEM block or not an RSA key.
    #[error("invalid service account key: {reason}")]
    KeyFormat {
        /// Error description.
        reason: String,
    },

    /// Signing the JWT assertion failed.
    #[error("failed to sign JWT: {reason}")]
    Signing {
        /// Error description.
        reason: String,
    },

    /// HTTP transport failure talking to the identity endpoint.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The identity endpoint answered with a non-200 status.
    #[error("IAM API error ({status}): {body}")]
    AuthApi {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The identity endpoint returned a body that is not a token response.
    #[error("failed to decode IAM response: {0}")]
    Decode(#[source] serde_json::Error),

    /// Service account key material could not be read or parsed.
    #[error("failed to load service account key from {origin}: {reason}")]
    KeyLoad {
        /// Where the key was loaded from (file path or `inline JSON`).
        origin: String,
        /// Error description.
        reason: String,
    },

    /// No usable credential was configured.
    #[error("no authentication method available: {0}")]
    NotConfigured(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

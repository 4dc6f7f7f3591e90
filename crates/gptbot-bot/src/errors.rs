//! Chat transport error types.

/// Errors raised by a [`crate::ChatTransport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP transport failure talking to the Bot API.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The Bot API answered `ok: false`.
    #[error("Bot API error ({code}): {description}")]
    Api {
        /// `error_code` from the response, or the HTTP status.
        code: i64,
        /// `description` from the response.
        description: String,
    },

    /// The response body is not a Bot API envelope.
    #[error("failed to decode Bot API response: {0}")]
    Decode(#[source] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

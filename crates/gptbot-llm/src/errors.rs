//! Completion error types.

use gptbot_auth::AuthError;

/// Errors returned by [`crate::CompletionClient::send_message`].
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// No bearer token could be obtained.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// HTTP transport failure talking to the completion endpoint.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The completion endpoint answered with a non-200 status.
    #[error("completion API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body is not a completion result.
    #[error("failed to decode completion response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The response carried no alternatives.
    #[error("no alternatives in completion response")]
    EmptyResponse,
}

impl CompletionError {
    /// HTTP status of an API rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Auth(AuthError::AuthApi { status, .. }) => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Network(_) => "network",
            Self::Api { .. } => "api",
            Self::Decode(_) => "decode",
            Self::EmptyResponse => "empty",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Wire types for the Foundation Models completion endpoint.

use serde::{Deserialize, Serialize};

/// Role of a message sent by the end user.
pub const ROLE_USER: &str = "user";

/// Body of a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    /// `gpt://<catalog>/<model>`.
    pub model_uri: String,
    /// Generation options.
    pub completion_options: CompletionOptions,
    /// Conversation so far, oldest first.
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    /// Request with a single user message.
    pub fn single_user_message(
        model_uri: impl Into<String>,
        options: CompletionOptions,
        text: impl Into<String>,
    ) -> Self {
        Self {
            model_uri: model_uri.into(),
            completion_options: options,
            messages: vec![Message::user(text)],
        }
    }
}

/// Generation options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    /// Partial results. Always `false` here.
    pub stream: bool,
    /// Sampling temperature.
    pub temperature: f64,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// Sampling temperature used unless overridden.
pub const DEFAULT_TEMPERATURE: f64 = 0.6;

/// Token limit used unless overridden.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            stream: false,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// One message in a request or response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// `user`, `assistant` or `system`.
    pub role: String,
    /// Message text.
    pub text: String,
}

impl Message {
    /// Message authored by the end user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            text: text.into(),
        }
    }
}

/// Body of a successful completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    /// Generation result.
    pub result: CompletionResult,
}

/// Generation result.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResult {
    /// Generated alternatives, best first.
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

/// One generated alternative.
#[derive(Debug, Clone, Deserialize)]
pub struct Alternative {
    /// Generated message.
    pub message: Message,
    /// Generation status, e.g. `ALTERNATIVE_STATUS_FINAL`.
    #[serde(default)]
    pub status: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

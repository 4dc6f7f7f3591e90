//! Telegram Bot API transport.
//!
//! Minimal client over `reqwest`: long-polls `getUpdates` and replies with
//! `sendMessage`. The bot token is part of every request URL, so URLs are
//! stripped from transport errors before they are returned.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::TransportError;
use crate::transport::{ChatTransport, IncomingMessage, Update};

/// Public Bot API base URL.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Seconds `getUpdates` waits for new updates.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;

/// Longest text accepted by `sendMessage`, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Slack on top of the long-poll timeout for the HTTP request.
const REQUEST_SLACK: Duration = Duration::from_secs(10);

/// Bot account returned by `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    /// Telegram user ID.
    pub id: i64,
    /// Bot display name.
    pub first_name: String,
    /// Bot username, without `@`.
    #[serde(default)]
    pub username: Option<String>,
}

/// `{"ok": ..., "result": ...}` envelope.
#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

#[derive(Deserialize)]
struct WireUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<WireMessage>,
}

#[derive(Deserialize)]
struct WireMessage {
    message_id: i64,
    chat: WireChat,
    #[serde(default)]
    from: Option<WireUser>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct WireChat {
    id: i64,
}

#[derive(Deserialize)]
struct WireUser {
    first_name: String,
    #[serde(default)]
    username: Option<String>,
}

impl From<WireUpdate> for Update {
    fn from(update: WireUpdate) -> Self {
        Self {
            update_id: update.update_id,
            message: update.message.map(|m| IncomingMessage {
                message_id: m.message_id,
                chat_id: m.chat.id,
                sender: m.from.map(|u| u.username.unwrap_or(u.first_name)),
                text: m.text,
            }),
        }
    }
}

#[derive(Serialize)]
struct GetUpdatesParams<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
    reply_parameters: ReplyParameters,
}

#[derive(Serialize)]
struct ReplyParameters {
    message_id: i64,
}

/// [`ChatTransport`] backed by the Telegram Bot API.
pub struct TelegramTransport {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
    poll_timeout_secs: u64,
}

impl std::fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramTransport")
            .field("base_url", &self.base_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl TelegramTransport {
    /// Create a transport for the public Bot API.
    pub fn new(token: SecretString) -> Result<Self, TransportError> {
        Self::with_poll_timeout(token, DEFAULT_POLL_TIMEOUT_SECS)
    }

    /// Create a transport with a custom long-poll timeout.
    pub fn with_poll_timeout(
        token: SecretString,
        poll_timeout_secs: u64,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs) + REQUEST_SLACK)
            .build()?;
        Ok(Self {
            client,
            base_url: TELEGRAM_API_URL.to_string(),
            token,
            poll_timeout_secs,
        })
    }

    /// Point the transport at a different Bot API server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Identity of the bot the token belongs to.
    #[tracing::instrument(skip_all)]
    pub async fn get_me(&self) -> Result<BotUser, TransportError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TransportError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!(
            "{}/bot{}/{method}",
            self.base_url,
            self.token.expose_secret()
        );
        let resp = self
            .client
            .post(url)
            .json(params)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Network(e.without_url()))?;

        let envelope: ApiResponse<R> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if status != 200 => {
                return Err(TransportError::Api {
                    code: i64::from(status),
                    description: body,
                });
            }
            Err(e) => return Err(TransportError::Decode(e)),
        };

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                ..
            } => Err(TransportError::Api {
                code: error_code.unwrap_or_else(|| i64::from(status)),
                description: description.unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    #[tracing::instrument(skip(self))]
    async fn poll_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        let params = GetUpdatesParams {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: &["message"],
        };
        let updates: Vec<WireUpdate> = self.call("getUpdates", &params).await?;
        debug!(count = updates.len(), "received updates");
        Ok(updates.into_iter().map(Update::from).collect())
    }

    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn send_reply(
        &self,
        chat_id: i64,
        reply_to: i64,
        text: &str,
    ) -> Result<(), TransportError> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let params = SendMessageParams {
                chat_id,
                text: chunk,
                reply_parameters: ReplyParameters {
                    message_id: reply_to,
                },
            };
            let _sent: serde_json::Value = self.call("sendMessage", &params).await?;
        }
        Ok(())
    }
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Prefers breaking after the last newline in a piece. Empty input yields one
/// empty piece so the API reports the error. A `max_chars` of zero is treated
/// as one.
pub fn split_message(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut rest = text;
    while rest.chars().count() > max_chars {
        let hard_end = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(i, _)| i);
        let end = rest[..hard_end]
            .rfind('\n')
            .filter(|&i| i > 0)
            .map_or(hard_end, |i| i + 1);
        pieces.push(&rest[..end]);
        rest = &rest[end..];
    }
    pieces.push(rest);
    pieces
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123456:ABC-secret";

    fn transport(server: &MockServer) -> TelegramTransport {
        TelegramTransport::with_poll_timeout(SecretString::from(TOKEN), 1)
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn get_me_returns_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getMe")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"id": 1, "is_bot": true, "first_name": "GPT", "username": "gpt_bot"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let me = transport(&server).get_me().await.unwrap();
        assert_eq!(me.username.as_deref(), Some("gpt_bot"));
        assert_eq!(me.first_name, "GPT");
    }

    #[tokio::test]
    async fn poll_updates_sends_offset_and_maps_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .and(body_json(serde_json::json!({
                "offset": 17,
                "timeout": 1,
                "allowed_updates": ["message"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {
                        "update_id": 17,
                        "message": {
                            "message_id": 5,
                            "date": 1_700_000_000,
                            "chat": {"id": -100, "type": "group"},
                            "from": {"id": 9, "is_bot": false, "first_name": "Bob"},
                            "text": "hello"
                        }
                    },
                    {
                        "update_id": 18,
                        "message": {
                            "message_id": 6,
                            "date": 1_700_000_001,
                            "chat": {"id": 9, "type": "private"},
                            "from": {"id": 9, "is_bot": false, "first_name": "Bob", "username": "bob"},
                            "photo": []
                        }
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updates = transport(&server).poll_updates(17).await.unwrap();
        assert_eq!(updates.len(), 2);

        let first = updates[0].message.as_ref().unwrap();
        assert_eq!(first.chat_id, -100);
        assert_eq!(first.message_id, 5);
        assert_eq!(first.sender.as_deref(), Some("Bob"));
        assert_eq!(first.text(), Some("hello"));

        let second = updates[1].message.as_ref().unwrap();
        assert_eq!(second.sender.as_deref(), Some("bob"));
        assert_eq!(second.text(), None);
    }

    #[tokio::test]
    async fn send_reply_sets_reply_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .and(body_json(serde_json::json!({
                "chat_id": 42,
                "text": "Hi there",
                "reply_parameters": {"message_id": 7}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 8, "date": 0, "chat": {"id": 42, "type": "private"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        transport(&server).send_reply(42, 7, "Hi there").await.unwrap();
    }

    #[tokio::test]
    async fn long_reply_is_split() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 8}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let text = "я".repeat(MAX_MESSAGE_CHARS + 1);
        transport(&server).send_reply(42, 7, &text).await.unwrap();
    }

    #[tokio::test]
    async fn api_error_carries_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: message to be replied not found"
            })))
            .mount(&server)
            .await;

        let err = transport(&server).send_reply(42, 7, "hi").await.unwrap_err();
        assert_matches!(
            err,
            TransportError::Api { code: 400, ref description } if description.contains("replied not found")
        );
    }

    #[tokio::test]
    async fn non_json_error_body_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = transport(&server).poll_updates(0).await.unwrap_err();
        assert_matches!(err, TransportError::Api { code: 502, .. });
    }

    #[tokio::test]
    async fn network_error_hides_token() {
        let transport = TelegramTransport::with_poll_timeout(SecretString::from(TOKEN), 1)
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = transport.poll_updates(0).await.unwrap_err();
        assert_matches!(err, TransportError::Network(_));
        assert!(!err.to_string().contains("ABC-secret"));
    }

    #[test]
    fn debug_hides_token() {
        let transport = TelegramTransport::new(SecretString::from(TOKEN)).unwrap();
        assert!(!format!("{transport:?}").contains("ABC-secret"));
    }

    #[test]
    fn split_short_text_is_single_piece() {
        assert_eq!(split_message("hello", 10), vec!["hello"]);
        assert_eq!(split_message("", 10), vec![""]);
    }

    #[test]
    fn split_with_zero_width_yields_single_chars() {
        assert_eq!(split_message("abc", 0), vec!["a", "b", "c"]);
        assert_eq!(split_message("", 0), vec![""]);
    }

    #[test]
    fn split_prefers_newlines() {
        assert_eq!(split_message("abc\ndefgh", 6), vec!["abc\n", "defgh"]);
    }

    #[test]
    fn split_counts_characters_not_bytes() {
        let text = "ёё\u{1F600}ёё";
        let pieces = split_message(text, 2);
        assert_eq!(pieces, vec!["ёё", "\u{1F600}ё", "ё"]);
        assert_eq!(pieces.concat(), text);
    }
}

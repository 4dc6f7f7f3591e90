//! Message relay loop.
//!
//! Pulls updates from a [`ChatTransport`], asks a [`Completer`] for a reply to
//! each text message and posts the result back as a reply. Messages are
//! handled one at a time in update order. Nothing here is fatal: completion
//! failures become a fallback reply and send failures are logged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gptbot_llm::{CompletionClient, CompletionError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::transport::{ChatTransport, IncomingMessage};

/// Pause after a failed poll before polling again.
pub const DEFAULT_POLL_BACKOFF: Duration = Duration::from_secs(3);

/// Produces a reply for one user message.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Generate a reply to `text`.
    async fn complete(&self, text: &str) -> Result<String, CompletionError>;
}

#[async_trait]
impl Completer for CompletionClient {
    async fn complete(&self, text: &str) -> Result<String, CompletionError> {
        self.send_message(text).await
    }
}

/// Outcome of handling one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The generated text was sent.
    Generated,
    /// Generation failed and the fallback reply was sent.
    Fallback,
    /// Sending the reply failed.
    SendFailed,
}

/// Relays chat messages to a completer and back.
pub struct Relay {
    transport: Arc<dyn ChatTransport>,
    completer: Arc<dyn Completer>,
    fallback_message: String,
    poll_backoff: Duration,
}

impl Relay {
    /// Create a relay.
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        completer: Arc<dyn Completer>,
        fallback_message: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            completer,
            fallback_message: fallback_message.into(),
            poll_backoff: DEFAULT_POLL_BACKOFF,
        }
    }

    /// Override the pause after a failed poll.
    #[must_use]
    pub fn with_poll_backoff(mut self, backoff: Duration) -> Self {
        self.poll_backoff = backoff;
        self
    }

    /// Reply sent when generation fails.
    pub fn fallback_reply(&self, original: &str) -> String {
        format!("{} {original}", self.fallback_message)
    }

    /// Generate and send the reply to one text message.
    #[tracing::instrument(skip_all, fields(chat_id = message.chat_id, message_id = message.message_id))]
    pub async fn handle_message(&self, message: &IncomingMessage, text: &str) -> Handled {
        info!(sender = message.sender.as_deref().unwrap_or("unknown"), text, "incoming message");

        let (reply, outcome) = match self.completer.complete(text).await {
            Ok(reply) => (reply, Handled::Generated),
            Err(e) => {
                error!(
                    error = %e,
                    status = ?e.status(),
                    kind = e.kind(),
                    "completion failed, sending fallback"
                );
                (self.fallback_reply(text), Handled::Fallback)
            }
        };

        let outcome = match self
            .transport
            .send_reply(message.chat_id, message.message_id, &reply)
            .await
        {
            Ok(()) => outcome,
            Err(e) => {
                warn!(error = %e, "failed to send reply");
                Handled::SendFailed
            }
        };

        let label = match outcome {
            Handled::Generated => "generated",
            Handled::Fallback => "fallback",
            Handled::SendFailed => "send_failed",
        };
        metrics::counter!("relay_messages_total", "outcome" => label).increment(1);
        outcome
    }

    /// Poll and relay until `shutdown` is cancelled.
    ///
    /// A message already being handled is finished before returning.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut offset = 0_i64;
        info!("relay started");

        loop {
            let polled = tokio::select! {
                () = shutdown.cancelled() => break,
                polled = self.transport.poll_updates(offset) => polled,
            };

            let updates = match polled {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, backoff = ?self.poll_backoff, "polling updates failed");
                    tokio::select! {
                        () = shutdown.cancelled() => break,
                        () = tokio::time::sleep(self.poll_backoff) => continue,
                    }
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                let Some(text) = message.text() else {
                    debug!(update_id = update.update_id, "skipping message without text");
                    continue;
                };
                let _ = self.handle_message(&message, text).await;
            }
        }

        info!("relay stopped");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

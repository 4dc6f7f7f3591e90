//! # gptbot-bot
//!
//! Chat side of the relay: the [`ChatTransport`] seam, its Telegram Bot API
//! implementation, and the [`Relay`] loop that feeds incoming text to a
//! [`Completer`] and replies with the result.

#![deny(unsafe_code)]

pub mod errors;
pub mod relay;
pub mod telegram;
pub mod transport;

pub use errors::TransportError;
pub use relay::{Completer, DEFAULT_POLL_BACKOFF, Handled, Relay};
pub use telegram::{BotUser, TelegramTransport};
pub use transport::{ChatTransport, IncomingMessage, Update};

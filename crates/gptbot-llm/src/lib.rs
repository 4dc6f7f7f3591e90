//! # gptbot-llm
//!
//! Client for the Yandex Foundation Models text completion API.
//!
//! [`CompletionClient`] sends one user message per call and returns the text
//! of the first generated alternative. Authentication is either a static
//! bearer token or an IAM token managed by [`gptbot_auth::TokenManager`]
//! (see [`Authorization`]).

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod types;

pub use client::{Authorization, COMPLETION_URL, CompletionClient, DEFAULT_MODEL};
pub use errors::CompletionError;
pub use types::{
    CompletionOptions, CompletionRequest, CompletionResponse, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE, Message,
};

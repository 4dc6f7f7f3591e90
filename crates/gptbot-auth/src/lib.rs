//! # gptbot-auth
//!
//! Yandex Cloud IAM authentication for outbound `YandexGPT` calls.
//!
//! Three credential forms are accepted (see [`Credential`]):
//! - **Static token**: used as-is, no lifecycle management
//! - **Service account key**: a PS256 JWT is minted per exchange and traded
//!   for a short-lived IAM token
//! - **OAuth token**: a Yandex Passport OAuth token is traded for an IAM token
//!
//! [`TokenManager`] caches the IAM token, refreshes it on demand once it
//! enters the expiry margin, and guarantees a single in-flight exchange per
//! manager.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gptbot_auth::{IamExchanger, ServiceAccountKey, TokenManager};
//!
//! # async fn demo() -> Result<(), gptbot_auth::AuthError> {
//! let key = ServiceAccountKey::from_file("authorized_key.json")?;
//! let manager = TokenManager::for_service_account(&key, Arc::new(IamExchanger::new()?))?;
//! let iam_token = manager.get_token().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod credential;
pub mod errors;
pub mod exchange;
pub mod manager;
pub mod signer;
pub mod token;

pub use credential::{Credential, ServiceAccountKey};
pub use errors::AuthError;
pub use exchange::{IAM_TOKEN_URL, IamExchanger, TokenExchange};
pub use manager::{DEFAULT_REFRESH_MARGIN, TokenManager};
pub use signer::{AssertionClaims, DEFAULT_ASSERTION_LIFETIME, TokenSigner};
pub use token::AccessToken;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

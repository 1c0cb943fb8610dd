//! Mail provider seam.
//!
//! The relay only needs four capabilities from a provider: send a message,
//! list messages under a label, trash a message and hand back the token the
//! client is currently using. [`Connector`] builds a per-request [`Mailbox`]
//! from the caller's credentials so that nothing is shared across requests.

pub mod gmail;
pub mod oauth;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use oauth::Token;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to parse credentials: {0}")]
    Credentials(String),

    #[error("failed to parse token: {0}")]
    InvalidToken(String),

    #[error("failed to get token: {0}")]
    TokenRefresh(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("failed to parse response: {0}")]
    Decode(String),
}

/// Subset of the Gmail message resource the relay reads or echoes back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_estimate: Option<i64>,
    /// URL-safe base64 of the full RFC 2822 message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Builds an authenticated mailbox client for one request.
pub trait Connector: Send + Sync {
    /// `credentials` is a client secret JSON document and `token` a token
    /// JSON value, both already stripped of markup.
    fn connect(&self, credentials: &str, token: &str) -> Result<Box<dyn Mailbox>, ProviderError>;
}

#[async_trait]
pub trait Mailbox: Send + Sync {
    async fn send(&self, message: &Message) -> Result<Message, ProviderError>;

    async fn list(&self, label: &str) -> Result<Vec<Message>, ProviderError>;

    async fn trash(&self, id: &str) -> Result<(), ProviderError>;

    /// The token the client is using right now, refreshed if it had expired.
    async fn token(&self) -> Result<Token, ProviderError>;
}

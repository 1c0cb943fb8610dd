//! Gmail API v1 client backing the relay.

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::oauth::{OAuthConfig, Token, TokenSource};
use super::{Connector, Mailbox, Message, ProviderError};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Creates one [`GmailMailbox`] per request, sharing the connection pool.
#[derive(Clone)]
pub struct GmailConnector {
    http: Client,
    api_base: String,
}

impl GmailConnector {
    pub fn new(http: Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Connector for GmailConnector {
    fn connect(&self, credentials: &str, token: &str) -> Result<Box<dyn Mailbox>, ProviderError> {
        let config = OAuthConfig::from_json(credentials)?;
        let token = Token::parse(token)?;

        Ok(Box::new(GmailMailbox {
            http: self.http.clone(),
            api_base: self.api_base.clone(),
            tokens: TokenSource::new(self.http.clone(), config, token),
        }))
    }
}

pub struct GmailMailbox {
    http: Client,
    api_base: String,
    tokens: TokenSource,
}

#[derive(Deserialize)]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
}

impl GmailMailbox {
    fn url(&self, path: &str) -> String {
        format!("{}/users/me/{}", self.api_base, path)
    }

    /// Sends `builder` with the current bearer token and decodes the body.
    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ProviderError> {
        let token = self.tokens.token().await?;
        let response = builder.bearer_auth(&token.access_token).send().await?;

        let status = response.status();
        debug!("Gmail API responded {}", status);
        let body = response.text().await?;

        if !status.is_success() {
            let err = api_error(status.as_u16(), &body);
            debug!("Gmail API call failed: {}", err);
            return Err(err);
        }

        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

/// Maps Google's `{"error": {"code", "message"}}` envelope, falling back to
/// the bare status.
fn api_error(status: u16, body: &str) -> ProviderError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let envelope = parsed.as_ref().and_then(|v| v.get("error"));

    match envelope.and_then(|e| e.get("message")).and_then(Value::as_str) {
        Some(message) => {
            let code = envelope
                .and_then(|e| e.get("code"))
                .and_then(Value::as_u64)
                .and_then(|c| u16::try_from(c).ok())
                .unwrap_or(status);
            ProviderError::Api {
                code,
                message: message.to_string(),
            }
        }
        None => ProviderError::Api {
            code: status,
            message: format!("HTTP {status}"),
        },
    }
}

#[async_trait]
impl Mailbox for GmailMailbox {
    async fn send(&self, message: &Message) -> Result<Message, ProviderError> {
        let builder = self.http.post(self.url("messages/send")).json(message);
        self.execute(builder).await
    }

    async fn list(&self, label: &str) -> Result<Vec<Message>, ProviderError> {
        let builder = self
            .http
            .get(self.url("messages"))
            .query(&[("labelIds", label)]);
        let response: ListMessagesResponse = self.execute(builder).await?;
        Ok(response.messages)
    }

    async fn trash(&self, id: &str) -> Result<(), ProviderError> {
        let builder = self
            .http
            .post(self.url(&format!("messages/{id}/trash")))
            .json(&json!({}));
        let _: Message = self.execute(builder).await?;
        Ok(())
    }

    async fn token(&self) -> Result<Token, ProviderError> {
        self.tokens.token().await
    }
}

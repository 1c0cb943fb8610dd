//! OAuth2 pieces needed to talk to Google on behalf of the caller.
//!
//! The caller hands us a Google client secret document and a token. The
//! token is used as-is while it is valid; once it expires it is exchanged
//! at the client's token endpoint, provided a refresh token came with it.
//! Nothing is persisted: a refreshed token lives as long as the request.

use chrono::{DateTime, Datelike, Duration, Utc};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use super::ProviderError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to their expiry are treated as expired.
const EXPIRY_DELTA_SECS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    web: Option<ClientSecretSection>,
    installed: Option<ClientSecretSection>,
}

#[derive(Deserialize)]
struct ClientSecretSection {
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    token_uri: Option<String>,
}

impl OAuthConfig {
    /// Parses a client secret JSON document as downloaded from the Google
    /// Cloud console, either the `web` or the `installed` flavour.
    pub fn from_json(raw: &str) -> Result<Self, ProviderError> {
        let file: ClientSecretFile =
            serde_json::from_str(raw).map_err(|e| ProviderError::Credentials(e.to_string()))?;

        let section = file
            .web
            .or(file.installed)
            .ok_or_else(|| ProviderError::Credentials("no credentials found".to_string()))?;

        if section.redirect_uris.is_empty() {
            return Err(ProviderError::Credentials(
                "missing redirect URL in the client credentials".to_string(),
            ));
        }

        let token_uri = section
            .token_uri
            .filter(|uri| !uri.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        Ok(Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
            token_uri,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// Accepts either a bare JSON string, taken as the access token, or a
    /// token object with `access_token`, `refresh_token` and `expiry`.
    pub fn parse(raw: &str) -> Result<Self, ProviderError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ProviderError::InvalidToken(e.to_string()))?;

        let mut token = match value {
            Value::String(access_token) => Token {
                access_token,
                ..Default::default()
            },
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| ProviderError::InvalidToken(e.to_string()))?,
            _ => {
                return Err(ProviderError::InvalidToken(
                    "expected a JSON string or object".to_string(),
                ))
            }
        };

        // Go clients serialize "no expiry" as the zero time, year 1.
        token.expiry = token.expiry.filter(|expiry| expiry.year() > 1);

        if token.access_token.is_empty() && token.refresh_token.is_none() {
            return Err(ProviderError::InvalidToken(
                "neither an access token nor a refresh token was given".to_string(),
            ));
        }

        Ok(token)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_DELTA_SECS) > now,
            None => true,
        }
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Hands out a valid token, refreshing it in place when it has expired.
pub struct TokenSource {
    http: Client,
    config: OAuthConfig,
    current: Mutex<Token>,
}

impl TokenSource {
    pub fn new(http: Client, config: OAuthConfig, token: Token) -> Self {
        Self {
            http,
            config,
            current: Mutex::new(token),
        }
    }

    pub async fn token(&self) -> Result<Token, ProviderError> {
        let mut current = self.current.lock().await;
        if current.is_valid_at(Utc::now()) {
            return Ok(current.clone());
        }

        let refresh_token = current.refresh_token.clone().ok_or_else(|| {
            ProviderError::TokenRefresh("token expired and refresh token is not set".to_string())
        })?;

        let refreshed = self.refresh(&refresh_token).await?;
        *current = refreshed.clone();
        Ok(refreshed)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Token, ProviderError> {
        debug!("Refreshing access token at {}", self.config.token_uri);

        let response = self
            .http
            .post(&self.config.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::TokenRefresh(format!(
                "cannot fetch token: {status} Response: {body}"
            )));
        }

        let parsed: RefreshResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::TokenRefresh(format!("malformed token response: {e}")))?;

        Ok(Token {
            access_token: parsed.access_token,
            token_type: parsed.token_type,
            refresh_token: parsed
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
            expiry: parsed
                .expires_in
                .filter(|secs| *secs > 0)
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

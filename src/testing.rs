//! In-memory provider used by the handler and cleanup tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::provider::{Connector, Mailbox, Message, ProviderError, Token};

/// Records every call it receives and fails on the one named by
/// [`StubMailbox::failing_on`]. Clones share the call log.
#[derive(Clone, Default)]
pub struct StubMailbox {
    labels: HashMap<String, Vec<String>>,
    fail_on: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubMailbox {
    pub fn with_label(mut self, label: &str, ids: &[&str]) -> Self {
        self.labels
            .insert(label.to_string(), ids.iter().map(|id| id.to_string()).collect());
        self
    }

    /// `call` is matched against the log entry, e.g. `"send"`, `"list INBOX"`,
    /// `"trash abc"` or `"token"`.
    pub fn failing_on(mut self, call: &str) -> Self {
        self.fail_on = Some(call.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ProviderError> {
        let fails = self.fail_on.as_deref() == Some(call.as_str());
        self.calls.lock().unwrap().push(call);
        if fails {
            return Err(ProviderError::Api {
                code: 503,
                message: "stub failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Mailbox for StubMailbox {
    async fn send(&self, message: &Message) -> Result<Message, ProviderError> {
        self.record("send".to_string())?;
        Ok(Message {
            id: "sent-1".to_string(),
            thread_id: Some("thread-1".to_string()),
            label_ids: vec!["SENT".to_string()],
            raw: message.raw.clone(),
            ..Default::default()
        })
    }

    async fn list(&self, label: &str) -> Result<Vec<Message>, ProviderError> {
        self.record(format!("list {label}"))?;
        Ok(self
            .labels
            .get(label)
            .into_iter()
            .flatten()
            .map(|id| Message {
                id: id.clone(),
                ..Default::default()
            })
            .collect())
    }

    async fn trash(&self, id: &str) -> Result<(), ProviderError> {
        self.record(format!("trash {id}"))
    }

    async fn token(&self) -> Result<Token, ProviderError> {
        self.record("token".to_string())?;
        Ok(Token {
            access_token: "stub-access".to_string(),
            token_type: "Bearer".to_string(),
            ..Default::default()
        })
    }
}

/// Hands out clones of one [`StubMailbox`] and remembers what it was given.
#[derive(Clone, Default)]
pub struct StubConnector {
    pub mailbox: StubMailbox,
    reject: bool,
    received: Arc<Mutex<Vec<(String, String)>>>,
}

impl StubConnector {
    pub fn new(mailbox: StubMailbox) -> Self {
        Self {
            mailbox,
            ..Default::default()
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    /// `(credentials, token)` pairs passed to `connect`.
    pub fn received(&self) -> Vec<(String, String)> {
        self.received.lock().unwrap().clone()
    }
}

impl Connector for StubConnector {
    fn connect(&self, credentials: &str, token: &str) -> Result<Box<dyn Mailbox>, ProviderError> {
        self.received
            .lock()
            .unwrap()
            .push((credentials.to_string(), token.to_string()));
        if self.reject {
            return Err(ProviderError::Credentials("no credentials found".to_string()));
        }
        Ok(Box::new(self.mailbox.clone()))
    }
}

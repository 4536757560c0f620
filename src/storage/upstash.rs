//! Upstash REST Session Storage
//!
//! Information Hiding:
//! - REST command encoding and response envelope hidden from users
//! - Stateless: every operation is one HTTP request, nothing to close
//! - Same list layout as the Redis backend, so both can share a database

use super::{session_key, trim_count, SessionStore, DEFAULT_KEY_PREFIX};
use crate::error::{Result, StoreError};
use crate::message::Message;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Connection settings for [`UpstashStore`]; `url` and `token` are required
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstashConfig {
    pub url: String,
    pub token: String,
    #[serde(default)]
    pub key_prefix: Option<String>,
}

impl UpstashConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            key_prefix: None,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Response envelope of the REST API
#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// A list entry as returned by LRANGE: still JSON text, or already decoded
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Text(String),
    Decoded(Message),
}

impl StoredEntry {
    fn into_message(self) -> Result<Message> {
        match self {
            StoredEntry::Text(raw) => Ok(serde_json::from_str(&raw)?),
            StoredEntry::Decoded(message) => Ok(message),
        }
    }
}

/// Session storage on Upstash Redis, reached over its HTTP command API
pub struct UpstashStore {
    client: Client,
    url: String,
    token: String,
    key_prefix: String,
}

impl UpstashStore {
    pub fn new(config: UpstashConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(StoreError::config("upstash url is required"));
        }
        if config.token.trim().is_empty() {
            return Err(StoreError::config("upstash token is required"));
        }

        Ok(Self {
            client: Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            token: config.token,
            key_prefix: config
                .key_prefix
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
        })
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn key(&self, user_id: &str) -> String {
        session_key(&self.key_prefix, user_id)
    }

    /// Run one command and return its `result`
    async fn command(&self, command: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<CommandResponse>(&body) {
            Ok(CommandResponse {
                error: Some(message),
                ..
            }) => Err(StoreError::Upstash {
                status: status.as_u16(),
                message,
            }),
            Ok(_) if !status.is_success() => Err(StoreError::Upstash {
                status: status.as_u16(),
                message: body,
            }),
            Ok(parsed) => Ok(parsed.result),
            Err(_) if !status.is_success() => Err(StoreError::Upstash {
                status: status.as_u16(),
                message: body,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SessionStore for UpstashStore {
    async fn add_message(&self, user_id: &str, message: Message) -> Result<()> {
        let key = self.key(user_id);
        let payload = serde_json::to_string(&message)?;
        self.command(json!(["RPUSH", key, payload])).await?;
        tracing::debug!("[UpstashStore] RPUSH '{}'", key);
        Ok(())
    }

    async fn get_session(&self, user_id: &str) -> Result<Vec<Message>> {
        let key = self.key(user_id);
        let result = self.command(json!(["LRANGE", key, 0, -1])).await?;

        let Value::Array(entries) = result else {
            tracing::warn!(
                "[UpstashStore] LRANGE '{}' returned a non-list result, treating as empty",
                key
            );
            return Ok(Vec::new());
        };

        let history = entries
            .into_iter()
            .map(|entry| serde_json::from_value::<StoredEntry>(entry)?.into_message())
            .collect::<Result<Vec<Message>>>()?;
        tracing::debug!("[UpstashStore] Loaded {} messages from '{}'", history.len(), key);
        Ok(history)
    }

    async fn reset_session(&self, user_id: &str) -> Result<()> {
        let key = self.key(user_id);
        self.command(json!(["DEL", key])).await?;
        tracing::debug!("[UpstashStore] Deleted '{}'", key);
        Ok(())
    }

    async fn trim_session(&self, user_id: &str, memory_window: usize) -> Result<()> {
        let key = self.key(user_id);
        let len: usize = serde_json::from_value(self.command(json!(["LLEN", key])).await?)?;

        if let Some(drop) = trim_count(len, memory_window) {
            self.command(json!(["LTRIM", key, drop, -1])).await?;
            tracing::debug!("[UpstashStore] LTRIM '{}' dropped {} messages", key, drop);
        }
        Ok(())
    }
}

//! Redis Session Storage
//!
//! Information Hiding:
//! - Connection management and TLS negotiation hidden from users
//! - Each session is a Redis list at `{key_prefix}{user_id}`, one JSON entry per message
//! - Trim is a single LTRIM, never a read-modify-write of the whole list

use super::{session_key, trim_count, SessionStore, DEFAULT_KEY_PREFIX};
use crate::error::{Result, StoreError};
use crate::message::Message;
use async_trait::async_trait;
use redis::aio::{ConnectionLike, ConnectionManager, ConnectionManagerConfig};
use redis::{
    AsyncCommands, Client, ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisConnectionInfo,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Hosts under this domain are managed instances that require TLS
const MANAGED_TLS_DOMAIN: &str = "upstash.io";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 6379;
const MAX_RECONNECT_ATTEMPTS: usize = 3;

/// Connection settings for [`RedisStore`]
///
/// `url` wins over `host`/`port`/`password` when both are given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub key_prefix: Option<String>,
}

impl RedisConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn key_prefix(&self) -> &str {
        self.key_prefix.as_deref().unwrap_or(DEFAULT_KEY_PREFIX)
    }

    /// Resolve the connection target, upgrading to TLS for managed hosts
    pub fn connection_info(&self) -> Result<ConnectionInfo> {
        if let Some(url) = &self.url {
            let url = if url.contains(MANAGED_TLS_DOMAIN) && url.starts_with("redis://") {
                url.replacen("redis://", "rediss://", 1)
            } else {
                url.clone()
            };
            return Ok(url.as_str().into_connection_info()?);
        }

        let host = self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = self.port.unwrap_or(DEFAULT_PORT);
        let addr = if host.contains(MANAGED_TLS_DOMAIN) {
            ConnectionAddr::TcpTls {
                host,
                port,
                insecure: false,
                tls_params: None,
            }
        } else {
            ConnectionAddr::Tcp(host, port)
        };

        Ok(ConnectionInfo {
            addr,
            redis: RedisConnectionInfo {
                password: self.password.clone(),
                ..Default::default()
            },
        })
    }
}

/// Redis-backed session storage over a persistent connection
///
/// Requests fail fast while the connection is down: a failed request is
/// returned to the caller immediately, and the connection manager makes at
/// most three reconnect attempts in the background.
pub struct RedisStore {
    connection: RwLock<Option<ConnectionManager>>,
    key_prefix: String,
}

impl RedisStore {
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let info = config.connection_info()?;
        tracing::info!("[RedisStore] Connecting to {}", info.addr);

        let client = Client::open(info)?;
        let manager_config =
            ConnectionManagerConfig::new().set_number_of_retries(MAX_RECONNECT_ATTEMPTS);
        let manager = ConnectionManager::new_with_config(client, manager_config).await?;

        Ok(Self {
            connection: RwLock::new(Some(manager)),
            key_prefix: config.key_prefix().to_string(),
        })
    }

    /// Close the persistent connection. Later calls return [`StoreError::Disconnected`]
    pub async fn disconnect(&self) -> Result<()> {
        let taken = self.connection.write().await.take();
        if let Some(mut conn) = taken {
            let _: () = redis::cmd("QUIT").query_async(&mut conn).await?;
            tracing::info!("[RedisStore] Disconnected");
        }
        Ok(())
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn key(&self, user_id: &str) -> String {
        session_key(&self.key_prefix, user_id)
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or(StoreError::Disconnected)
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn add_message(&self, user_id: &str, message: Message) -> Result<()> {
        let mut conn = self.connection().await?;
        push_message(&mut conn, &self.key(user_id), &message).await
    }

    async fn get_session(&self, user_id: &str) -> Result<Vec<Message>> {
        let mut conn = self.connection().await?;
        read_session(&mut conn, &self.key(user_id)).await
    }

    async fn reset_session(&self, user_id: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        delete_session(&mut conn, &self.key(user_id)).await
    }

    async fn trim_session(&self, user_id: &str, memory_window: usize) -> Result<()> {
        let mut conn = self.connection().await?;
        trim_list(&mut conn, &self.key(user_id), memory_window).await
    }
}

// List commands, generic over the connection so they run against any
// `ConnectionLike`, not only the connection manager.

async fn push_message<C>(conn: &mut C, key: &str, message: &Message) -> Result<()>
where
    C: ConnectionLike + Send,
{
    let payload = serde_json::to_string(message)?;
    let len: usize = conn.rpush(key, payload).await?;
    tracing::debug!("[RedisStore] RPUSH '{}' ({} total)", key, len);
    Ok(())
}

async fn read_session<C>(conn: &mut C, key: &str) -> Result<Vec<Message>>
where
    C: ConnectionLike + Send,
{
    let entries: Vec<String> = conn.lrange(key, 0, -1).await?;
    let history = entries
        .iter()
        .map(|entry| serde_json::from_str(entry))
        .collect::<std::result::Result<Vec<Message>, _>>()?;
    tracing::debug!("[RedisStore] Loaded {} messages from '{}'", history.len(), key);
    Ok(history)
}

async fn delete_session<C>(conn: &mut C, key: &str) -> Result<()>
where
    C: ConnectionLike + Send,
{
    let _: () = conn.del(key).await?;
    tracing::debug!("[RedisStore] Deleted '{}'", key);
    Ok(())
}

/// `LLEN`, then a single `LTRIM key <drop> -1` when over the cap
async fn trim_list<C>(conn: &mut C, key: &str, memory_window: usize) -> Result<()>
where
    C: ConnectionLike + Send,
{
    let len: usize = conn.llen(key).await?;

    if let Some(drop) = trim_count(len, memory_window) {
        let _: () = redis::cmd("LTRIM")
            .arg(key)
            .arg(drop)
            .arg(-1)
            .query_async(conn)
            .await?;
        tracing::debug!("[RedisStore] LTRIM '{}' dropped {} messages", key, drop);
    }
    Ok(())
}

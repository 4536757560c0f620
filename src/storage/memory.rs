//! In-Memory Session Storage
//!
//! Information Hiding:
//! - HashMap storage structure hidden from users
//! - Thread-safe access via RwLock hidden behind async interface
//! - Suitable for testing and ephemeral sessions

use super::{trim_count, SessionStore};
use crate::error::Result;
use crate::message::Message;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage using HashMap
/// Data is lost when process terminates
#[derive(Clone)]
pub struct InMemoryStore {
    sessions: Arc<RwLock<HashMap<String, Vec<Message>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of users with a live session
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn add_message(&self, user_id: &str, message: Message) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(user_id.to_string()).or_default();
        session.push(message);
        tracing::debug!(
            "[InMemoryStore] Appended message for user '{}' ({} total)",
            user_id,
            session.len()
        );
        Ok(())
    }

    async fn get_session(&self, user_id: &str) -> Result<Vec<Message>> {
        let sessions = self.sessions.read().await;
        let history = sessions.get(user_id).cloned().unwrap_or_default();
        tracing::debug!(
            "[InMemoryStore] Loaded {} messages for user '{}'",
            history.len(),
            user_id
        );
        Ok(history)
    }

    async fn reset_session(&self, user_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(user_id);
        tracing::debug!("[InMemoryStore] Reset session for user '{}'", user_id);
        Ok(())
    }

    async fn trim_session(&self, user_id: &str, memory_window: usize) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(user_id) else {
            return Ok(());
        };

        if let Some(drop) = trim_count(session.len(), memory_window) {
            session.drain(..drop);
            tracing::debug!(
                "[InMemoryStore] Trimmed {} messages for user '{}'",
                drop,
                user_id
            );
        }
        Ok(())
    }
}

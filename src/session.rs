//! Session Manager - Single Entry Point for Conversational Memory
//!
//! Information Hiding:
//! - Storage backend hidden behind `SessionStore`
//! - Window policy owned here, not by the backends
//! - Every write is followed by a trim before returning

use crate::config::Settings;
use crate::error::Result;
use crate::message::{Message, Role};
use crate::storage::{InMemoryStore, SessionStore};
use std::fmt;
use std::sync::Arc;

/// Default memory window, i.e. a 20 message cap
pub const DEFAULT_MEMORY_WINDOW: usize = 10;

/// Construction options for [`SessionManager`]
#[derive(Default, Clone)]
pub struct SessionConfig {
    /// `None` or `0` falls back to [`DEFAULT_MEMORY_WINDOW`]
    pub memory_window: Option<usize>,
    /// `None` uses a fresh [`InMemoryStore`]
    pub store: Option<Arc<dyn SessionStore>>,
}

/// Coordinates a store and the memory window applied to it
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    memory_window: usize,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::from_config(SessionConfig::default())
    }

    pub fn from_config(config: SessionConfig) -> Self {
        let memory_window = config
            .memory_window
            .filter(|window| *window > 0)
            .unwrap_or(DEFAULT_MEMORY_WINDOW);
        let store = config
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));

        Self {
            store,
            memory_window,
        }
    }

    /// Build the configured backend and window from loaded settings
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let store = settings.build_store().await?;
        tracing::info!(
            "[SessionManager] Using {:?} backend with memory window {}",
            settings.store.backend,
            settings.session.memory_window
        );

        Ok(Self::from_config(SessionConfig {
            memory_window: Some(settings.session.memory_window),
            store: Some(store),
        }))
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_memory_window(mut self, memory_window: usize) -> Self {
        self.memory_window = memory_window;
        self
    }

    /// The configured backend
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Append a message, then trim the session to the current window
    ///
    /// The append and the trim are two separate store calls. Concurrent senders
    /// for the same user can briefly leave the session over the cap until the
    /// next trim runs.
    pub async fn send_message(&self, user_id: &str, message: Message) -> Result<()> {
        self.store.add_message(user_id, message).await?;
        self.store.trim_session(user_id, self.memory_window).await
    }

    pub async fn get_session(&self, user_id: &str) -> Result<Vec<Message>> {
        self.store.get_session(user_id).await
    }

    pub async fn reset_session(&self, user_id: &str) -> Result<()> {
        tracing::debug!("[SessionManager] Resetting session for user '{}'", user_id);
        self.store.reset_session(user_id).await
    }

    pub async fn add_user_message(&self, user_id: &str, content: impl Into<String>) -> Result<()> {
        self.send_message(user_id, Message::new(Role::User, content))
            .await
    }

    pub async fn add_assistant_message(
        &self,
        user_id: &str,
        content: impl Into<String>,
    ) -> Result<()> {
        self.send_message(user_id, Message::new(Role::Assistant, content))
            .await
    }

    pub async fn add_system_message(
        &self,
        user_id: &str,
        content: impl Into<String>,
    ) -> Result<()> {
        self.send_message(user_id, Message::new(Role::System, content))
            .await
    }

    pub fn memory_window(&self) -> usize {
        self.memory_window
    }

    /// Change the window. Existing sessions shrink on their next send, not now
    pub fn set_memory_window(&mut self, memory_window: usize) {
        tracing::debug!(
            "[SessionManager] Memory window {} -> {}",
            self.memory_window,
            memory_window
        );
        self.memory_window = memory_window;
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("memory_window", &self.memory_window)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let manager = SessionManager::new();
        assert_eq!(manager.memory_window(), 10);
    }

    #[test]
    fn test_zero_window_in_config_falls_back() {
        let manager = SessionManager::from_config(SessionConfig {
            memory_window: Some(0),
            store: None,
        });
        assert_eq!(manager.memory_window(), DEFAULT_MEMORY_WINDOW);

        let manager = SessionManager::from_config(SessionConfig {
            memory_window: Some(3),
            store: None,
        });
        assert_eq!(manager.memory_window(), 3);
    }

    #[tokio::test]
    async fn test_role_wrappers() {
        let manager = SessionManager::new();
        manager.add_system_message("alice", "Be brief").await.unwrap();
        manager.add_user_message("alice", "Hello").await.unwrap();
        manager.add_assistant_message("alice", "Hi").await.unwrap();

        let roles: Vec<Role> = manager
            .get_session("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn test_shared_store_is_visible_to_caller() {
        let store = Arc::new(InMemoryStore::new());
        let manager = SessionManager::new().with_store(store.clone());
        manager.add_user_message("alice", "Hello").await.unwrap();

        assert_eq!(
            store.get_session("alice").await.unwrap(),
            vec![Message::user("Hello")]
        );
    }
}

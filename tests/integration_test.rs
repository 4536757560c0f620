//! Integration tests for Sessionkit
//!
//! These tests exercise the session manager against the in-process store and
//! need no external services

use async_trait::async_trait;
use sessionkit::{
    InMemoryStore, Message, Result, Role, SessionConfig, SessionManager, SessionStore,
};
use std::sync::{Arc, Mutex};

fn contents(session: &[Message]) -> Vec<&str> {
    session.iter().map(|m| m.content.as_str()).collect()
}

#[tokio::test]
async fn test_window_two_drops_oldest() {
    let manager = SessionManager::new().with_memory_window(2);

    manager.add_user_message("alice", "u1").await.unwrap();
    manager.add_assistant_message("alice", "a1").await.unwrap();
    manager.add_user_message("alice", "u2").await.unwrap();
    manager.add_assistant_message("alice", "a2").await.unwrap();
    manager.add_user_message("alice", "u3").await.unwrap();

    let session = manager.get_session("alice").await.unwrap();
    assert_eq!(session.len(), 4);
    assert_eq!(session[0], Message::assistant("a1"));
    assert_eq!(contents(&session), vec!["a1", "u2", "a2", "u3"]);
}

#[tokio::test]
async fn test_session_never_exceeds_cap() {
    let manager = SessionManager::new().with_memory_window(3);

    for i in 0..25 {
        manager
            .add_user_message("alice", format!("m{}", i))
            .await
            .unwrap();
        let len = manager.get_session("alice").await.unwrap().len();
        assert!(len <= 6, "session grew to {} messages", len);
    }

    let session = manager.get_session("alice").await.unwrap();
    assert_eq!(contents(&session), vec!["m19", "m20", "m21", "m22", "m23", "m24"]);
}

#[tokio::test]
async fn test_reset_untouched_user() {
    let manager = SessionManager::new();

    manager.reset_session("alice").await.unwrap();
    assert!(manager.get_session("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_then_get_is_empty() {
    let manager = SessionManager::new();
    manager.add_user_message("alice", "Hello").await.unwrap();
    manager.add_assistant_message("alice", "Hi").await.unwrap();

    manager.reset_session("alice").await.unwrap();
    assert!(manager.get_session("alice").await.unwrap().is_empty());

    manager.add_user_message("alice", "Again").await.unwrap();
    assert_eq!(
        manager.get_session("alice").await.unwrap(),
        vec![Message::user("Again")]
    );
}

#[tokio::test]
async fn test_round_trip_preserves_message() {
    let manager = SessionManager::new();
    let message = Message::system("You are a helpful assistant.\nBe brief.");

    manager.send_message("alice", message.clone()).await.unwrap();

    assert_eq!(manager.get_session("alice").await.unwrap(), vec![message]);
}

#[tokio::test]
async fn test_window_change_applies_on_next_send() {
    let store = Arc::new(InMemoryStore::new());
    let mut manager = SessionManager::from_config(SessionConfig {
        memory_window: Some(2),
        store: Some(store.clone()),
    });

    for i in 1..=4 {
        manager
            .add_user_message("alice", format!("m{}", i))
            .await
            .unwrap();
    }

    manager.set_memory_window(1);
    assert_eq!(manager.memory_window(), 1);
    assert_eq!(manager.get_session("alice").await.unwrap().len(), 4);

    manager.add_user_message("alice", "m5").await.unwrap();
    let session = manager.get_session("alice").await.unwrap();
    assert_eq!(contents(&session), vec!["m4", "m5"]);

    manager.add_assistant_message("alice", "a5").await.unwrap();
    let session = store.get_session("alice").await.unwrap();
    assert_eq!(contents(&session), vec!["m5", "a5"]);
}

#[tokio::test]
async fn test_users_are_isolated() {
    let manager = SessionManager::new().with_memory_window(1);

    manager.add_user_message("alice", "a1").await.unwrap();
    manager.add_user_message("bob", "b1").await.unwrap();
    manager.add_user_message("alice", "a2").await.unwrap();
    manager.add_user_message("alice", "a3").await.unwrap();

    assert_eq!(
        contents(&manager.get_session("alice").await.unwrap()),
        vec!["a2", "a3"]
    );
    assert_eq!(
        contents(&manager.get_session("bob").await.unwrap()),
        vec!["b1"]
    );
}

/// Records the calls the manager makes so ordering can be asserted
#[derive(Default)]
struct RecordingStore {
    calls: Mutex<Vec<String>>,
    inner: InMemoryStore,
}

impl RecordingStore {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn add_message(&self, user_id: &str, message: Message) -> Result<()> {
        self.record(format!("add:{}:{}", user_id, message.role));
        self.inner.add_message(user_id, message).await
    }

    async fn get_session(&self, user_id: &str) -> Result<Vec<Message>> {
        self.record(format!("get:{}", user_id));
        self.inner.get_session(user_id).await
    }

    async fn reset_session(&self, user_id: &str) -> Result<()> {
        self.record(format!("reset:{}", user_id));
        self.inner.reset_session(user_id).await
    }

    async fn trim_session(&self, user_id: &str, memory_window: usize) -> Result<()> {
        self.record(format!("trim:{}:{}", user_id, memory_window));
        self.inner.trim_session(user_id, memory_window).await
    }
}

#[tokio::test]
async fn test_every_send_is_followed_by_trim() {
    let store = Arc::new(RecordingStore::default());
    let mut manager = SessionManager::new().with_store(store.clone());

    manager.add_user_message("alice", "Hello").await.unwrap();
    manager.set_memory_window(3);
    manager
        .send_message("alice", Message::new(Role::Assistant, "Hi"))
        .await
        .unwrap();
    manager.get_session("alice").await.unwrap();
    manager.reset_session("alice").await.unwrap();

    assert_eq!(
        store.calls(),
        vec![
            "add:alice:user",
            "trim:alice:10",
            "add:alice:assistant",
            "trim:alice:3",
            "get:alice",
            "reset:alice",
        ]
    );
}

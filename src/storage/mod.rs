//! Session Storage Abstraction
//!
//! Information Hiding:
//! - Storage backend implementation details hidden behind trait
//! - Allows swapping between memory, Redis and Upstash REST without API changes
//! - Every backend applies the same window trim policy

use crate::error::Result;
use crate::message::Message;
use async_trait::async_trait;

pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;
pub mod upstash;

pub use memory::InMemoryStore;
#[cfg(feature = "redis-backend")]
pub use self::redis::{RedisConfig, RedisStore};
pub use upstash::{UpstashConfig, UpstashStore};

/// Namespace prepended to user ids by the remote backends
pub const DEFAULT_KEY_PREFIX: &str = "sessionkit:";

/// A session keeps at most `WINDOW_MULTIPLIER * memory_window` messages
pub const WINDOW_MULTIPLIER: usize = 2;

/// Trait defining the per-user session store
/// Implementations can use different backends (memory, Redis, Upstash REST)
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Append a message to the tail of the user's session, creating it if absent
    async fn add_message(&self, user_id: &str, message: Message) -> Result<()>;

    /// Load the full session, oldest first
    /// Returns empty vector if the session doesn't exist
    async fn get_session(&self, user_id: &str) -> Result<Vec<Message>>;

    /// Delete the session. Resetting a missing session is a no-op
    async fn reset_session(&self, user_id: &str) -> Result<()>;

    /// Drop the oldest messages so at most `2 * memory_window` remain
    async fn trim_session(&self, user_id: &str, memory_window: usize) -> Result<()>;
}

/// Message cap for a given window
pub fn max_messages(memory_window: usize) -> usize {
    memory_window.saturating_mul(WINDOW_MULTIPLIER)
}

/// Number of oldest messages to discard from a session of `len` entries,
/// or `None` when the session is already within bounds
pub fn trim_count(len: usize, memory_window: usize) -> Option<usize> {
    let max = max_messages(memory_window);
    (len > max).then(|| len - max)
}

/// Remote key for a user's session list
pub fn session_key(prefix: &str, user_id: &str) -> String {
    format!("{}{}", prefix, user_id)
}

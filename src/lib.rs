//! Sessionkit - Short-term conversational memory for chat applications
//!
//! Appends role-tagged messages to a per-user session, caps each session at
//! `2 * memory_window` messages and retrieves or resets session history.
//! Storage is pluggable: in-process, Redis, or Upstash over REST.
//!
//! ```rust,ignore
//! use sessionkit::SessionManager;
//!
//! let manager = SessionManager::new().with_memory_window(2);
//! manager.add_user_message("alice", "Hello").await?;
//! manager.add_assistant_message("alice", "Hi there").await?;
//! let history = manager.get_session("alice").await?;
//! ```

pub mod config;
pub mod error;
pub mod message;
pub mod session;
pub mod storage;

pub use config::Settings;
pub use error::{Result, StoreError};
pub use message::{Message, Role};
pub use session::{SessionConfig, SessionManager, DEFAULT_MEMORY_WINDOW};
#[cfg(feature = "redis-backend")]
pub use storage::{RedisConfig, RedisStore};
pub use storage::{InMemoryStore, SessionStore, UpstashConfig, UpstashStore};

//! Session Usage Example
//!
//! Loads settings from `config/` and `SESSIONKIT__*` variables (a `.env` file
//! is honoured), then walks through a short conversation with a small window.
//!
//! Run with the default in-memory store:
//!   cargo run --example session_usage
//! Or against Redis:
//!   SESSIONKIT__STORE__BACKEND=redis SESSIONKIT__STORE__REDIS__URL=redis://127.0.0.1:6379 \
//!     cargo run --example session_usage

use sessionkit::{SessionManager, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .init();

    println!("=== Session Usage Example ===\n");

    let mut manager = SessionManager::from_settings(&settings).await?;
    let user = "demo-user";
    manager.reset_session(user).await?;

    manager.set_memory_window(2);
    println!(
        "Memory window: {} (cap {} messages)\n",
        manager.memory_window(),
        sessionkit::storage::max_messages(manager.memory_window())
    );

    manager.add_system_message(user, "You are a concise assistant.").await?;
    manager.add_user_message(user, "What is the capital of France?").await?;
    manager.add_assistant_message(user, "Paris.").await?;
    manager.add_user_message(user, "And of Italy?").await?;
    manager.add_assistant_message(user, "Rome.").await?;

    println!("Session after five messages (oldest dropped):");
    for (i, message) in manager.get_session(user).await?.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, message.role, message.content);
    }

    manager.reset_session(user).await?;
    println!(
        "\nAfter reset: {} messages",
        manager.get_session(user).await?.len()
    );

    Ok(())
}

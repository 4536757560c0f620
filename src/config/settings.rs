use crate::error::StoreError;
#[cfg(feature = "redis-backend")]
use crate::storage::{RedisConfig, RedisStore};
use crate::storage::{InMemoryStore, SessionStore, UpstashConfig, UpstashStore};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_memory_window")]
    pub memory_window: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            memory_window: default_memory_window(),
        }
    }
}

fn default_memory_window() -> usize {
    crate::session::DEFAULT_MEMORY_WINDOW
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Redis,
    Upstash,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: Backend,
    #[cfg(feature = "redis-backend")]
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub upstash: Option<UpstashConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load `config/<SESSIONKIT_CONFIG_ENV>` (optional) overlaid with `SESSIONKIT__*` variables
    pub fn new() -> Result<Self, ConfigError> {
        let config_env =
            env::var("SESSIONKIT_CONFIG_ENV").unwrap_or_else(|_| "default".to_string());
        Self::load(
            File::with_name(&format!("config/{}", config_env)).required(false),
            Self::environment(),
        )
    }

    /// Load an explicit config file overlaid with `SESSIONKIT__*` variables
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load(File::from(path.as_ref()).required(true), Self::environment())
    }

    /// Like [`Settings::from_file`], but the overlay reads `vars` instead of the process environment
    #[cfg(test)]
    fn from_file_with_vars(path: &Path, vars: &[(&str, &str)]) -> Result<Self, ConfigError> {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<config::Map<String, String>>();
        Self::load(
            File::from(path).required(true),
            Self::environment().source(Some(vars)),
        )
    }

    fn environment() -> Environment {
        Environment::with_prefix("SESSIONKIT").separator("__")
    }

    fn load<S>(file: S, environment: Environment) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?;

        config.try_deserialize()
    }

    /// Construct the configured backend, connecting to it if it is remote
    pub async fn build_store(&self) -> Result<Arc<dyn SessionStore>, StoreError> {
        match self.store.backend {
            Backend::Memory => Ok(Arc::new(InMemoryStore::new())),
            #[cfg(feature = "redis-backend")]
            Backend::Redis => Ok(Arc::new(RedisStore::connect(self.store.redis.clone()).await?)),
            #[cfg(not(feature = "redis-backend"))]
            Backend::Redis => Err(StoreError::config(
                "redis backend requires the `redis-backend` feature",
            )),
            Backend::Upstash => {
                let upstash = self.store.upstash.clone().ok_or_else(|| {
                    StoreError::config("store.upstash section is required for the upstash backend")
                })?;
                Ok(Arc::new(UpstashStore::new(upstash)?))
            }
        }
    }
}

mod settings;

pub use settings::{Backend, LoggingConfig, SessionSettings, Settings, StoreSettings};

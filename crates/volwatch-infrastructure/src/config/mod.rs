mod app_config;
mod timeouts;

pub use app_config::{AppConfig, StorageBackend, TelegramConfig};
pub use timeouts::TimeoutConfig;

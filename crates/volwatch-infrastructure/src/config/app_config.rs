use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::timeouts::TimeoutConfig;

pub const DEFAULT_INDICATOR_URL: &str = "https://api.blockchair.com/bitcoin/blocks";
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Where user records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One `<uid>.json` file per user
    #[default]
    Json,
    /// A `users` table in `volwatch.db`
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" | "files" => Ok(StorageBackend::Json),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(anyhow::anyhow!("Unknown storage backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token; without one notifications only go to the log
    pub bot_token: Option<String>,
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: DEFAULT_TELEGRAM_API.to_string(),
        }
    }
}

/// Process configuration
///
/// Resolution order: defaults, then the JSON config file, then environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub storage: StorageBackend,
    pub log_dir: Option<PathBuf>,
    pub log_stdout: bool,
    pub indicator_url: String,
    pub http_timeout_secs: u64,
    pub health_check_interval_secs: u64,
    pub telegram: TelegramConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("volwatch"),
            storage: StorageBackend::default(),
            log_dir: None,
            log_stdout: cfg!(debug_assertions),
            indicator_url: DEFAULT_INDICATOR_URL.to_string(),
            http_timeout_secs: 30,
            health_check_interval_secs: 300,
            telegram: TelegramConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the file named by `VOLWATCH_CONFIG` (or
    /// `<data_dir>/config.json` when present) and the process environment.
    pub fn load() -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let explicit_path = lookup("VOLWATCH_CONFIG").map(PathBuf::from);
        let mut config = match &explicit_path {
            Some(path) => Self::from_file(path)?,
            None => {
                let defaults = Self::default();
                let candidate = defaults.data_dir.join("config.json");
                if candidate.exists() {
                    Self::from_file(&candidate)?
                } else {
                    defaults
                }
            }
        };

        config.apply_env(lookup)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides. `BOT_TOKEN` and `USERS_PATH` keep the
    /// names used by existing deployments.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(path) = lookup("USERS_PATH") {
            self.data_dir = PathBuf::from(path);
        }
        if let Some(backend) = lookup("VOLWATCH_STORAGE") {
            self.storage = backend.parse()?;
        }
        if let Some(secs) = lookup("VOLWATCH_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid VOLWATCH_HTTP_TIMEOUT_SECS: {secs}"))?;
        }
        if let Some(url) = lookup("VOLWATCH_INDICATOR_URL") {
            self.indicator_url = url;
        }
        if let Some(dir) = lookup("VOLWATCH_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = lookup("VOLWATCH_LOG_STDOUT") {
            self.log_stdout = matches!(flag.trim(), "1" | "true" | "yes");
        }
        Ok(())
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("logs"))
    }

    pub fn users_dir(&self) -> PathBuf {
        self.data_dir.join("users")
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("volwatch.db")
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs.max(1))
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        TimeoutConfig::default().with_http_request(Duration::from_secs(self.http_timeout_secs.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.storage, StorageBackend::Json);
        assert_eq!(config.indicator_url, DEFAULT_INDICATOR_URL);
        assert_eq!(config.timeouts().http_request, Duration::from_secs(30));
        assert!(config.telegram.bot_token.is_none());
        assert!(config.users_dir().ends_with("users"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("BOT_TOKEN", "123:abc"),
                ("USERS_PATH", "/srv/volwatch"),
                ("VOLWATCH_STORAGE", "sqlite"),
                ("VOLWATCH_HTTP_TIMEOUT_SECS", "5"),
            ]))
            .unwrap();

        assert_eq!(config.telegram.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(config.users_dir(), PathBuf::from("/srv/volwatch/users"));
        assert_eq!(config.log_dir(), PathBuf::from("/srv/volwatch/logs"));
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.timeouts().http_request, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_env_values_are_rejected() {
        let mut config = AppConfig::default();
        assert!(config
            .apply_env(env(&[("VOLWATCH_STORAGE", "redis")]))
            .is_err());
        assert!(config
            .apply_env(env(&[("VOLWATCH_HTTP_TIMEOUT_SECS", "soon")]))
            .is_err());
    }

    #[test]
    fn test_partial_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "data_dir": "/var/lib/volwatch", "storage": "sqlite", "telegram": { "bot_token": "t" } }"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/volwatch"));
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.telegram.bot_token.as_deref(), Some("t"));
        assert_eq!(config.telegram.api_base, DEFAULT_TELEGRAM_API);
        assert_eq!(config.http_timeout_secs, 30);
    }
}

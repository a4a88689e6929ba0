//! Application configuration management.
//!
//! This module handles loading and saving the dashboard configuration: the
//! API base URL, where tokens are kept, timeouts and notice behaviour.
//!
//! Configuration is stored at `~/.config/shopdash/config.json`. The base URL
//! can be overridden with `SHOPDASH_API_URL` and is resolved once at startup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::auth::{CredentialStore, FileStore, KeyringStore, MemoryStore};
use crate::notice::{NoticeBoard, VERIFY_EMAIL_NOTICE};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "shopdash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the configured API base URL
pub const API_URL_ENV: &str = "SHOPDASH_API_URL";

/// Used when neither the environment nor the config file names a host
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    Keyring,
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub token_backend: TokenBackend,
    pub request_timeout_secs: u64,
    pub notice_ttl_secs: u64,
    /// Notices that never auto-dismiss
    pub sticky_notices: Vec<String>,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            token_backend: TokenBackend::default(),
            request_timeout_secs: crate::api::client::REQUEST_TIMEOUT_SECS,
            notice_ttl_secs: 3,
            sticky_notices: vec![VERIFY_EMAIL_NOTICE.to_string()],
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// API base URL: environment override, then config file, then default
    pub fn api_base_url(&self) -> String {
        Self::resolve_base_url(std::env::var(API_URL_ENV).ok(), self.api_base_url.as_deref())
    }

    fn resolve_base_url(env: Option<String>, configured: Option<&str>) -> String {
        env.filter(|v| !v.trim().is_empty())
            .or_else(|| configured.filter(|v| !v.trim().is_empty()).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn notice_board(&self) -> NoticeBoard {
        NoticeBoard::with_sticky_messages(
            Duration::from_secs(self.notice_ttl_secs),
            self.sticky_notices.clone(),
        )
    }

    /// Open the configured token store
    pub fn credential_store(&self) -> Result<Arc<dyn CredentialStore>> {
        Ok(match self.token_backend {
            TokenBackend::Keyring => Arc::new(KeyringStore::new()),
            TokenBackend::File => Arc::new(FileStore::new(self.cache_dir()?)),
            TokenBackend::Memory => Arc::new(MemoryStore::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_precedence() {
        assert_eq!(
            Config::resolve_base_url(Some("https://env/api/".to_string()), Some("https://file/api")),
            "https://env/api"
        );
        assert_eq!(
            Config::resolve_base_url(None, Some("https://file/api")),
            "https://file/api"
        );
        assert_eq!(
            Config::resolve_base_url(Some("  ".to_string()), None),
            DEFAULT_API_BASE_URL
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"token_backend":"file"}"#).unwrap();
        assert_eq!(config.token_backend, TokenBackend::File);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.sticky_notices, vec![VERIFY_EMAIL_NOTICE.to_string()]);
    }

    #[test]
    fn test_notice_board_from_config() {
        let config = Config {
            notice_ttl_secs: 1,
            sticky_notices: vec!["stay".to_string()],
            ..Config::default()
        };
        let mut board = config.notice_board();
        let start = std::time::Instant::now();
        board.post("stay", start);
        assert_eq!(board.current(start + Duration::from_secs(5)), Some("stay"));
        board.post("go", start);
        assert_eq!(board.current(start + Duration::from_secs(1)), None);
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_NEWS_BASE_URL: &str = "https://newsapi.org/v2";

/// Sentinel written into fresh config files; the chat panel refuses to send
/// until the deployer replaces it.
pub const RELAY_URL_PLACEHOLDER: &str = "YOUR_RELAY_URL";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub news_api_key: Option<String>,
    pub news_base_url: Option<String>,
    pub relay_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            news_api_key: None,
            news_base_url: Some(DEFAULT_NEWS_BASE_URL.to_string()),
            relay_url: Some(RELAY_URL_PLACEHOLDER.to_string()),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("newsdesk"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

/// A relay URL is configured once it is non-blank and no longer the
/// placeholder shipped in fresh config files.
pub fn relay_is_configured(url: Option<&str>) -> bool {
    match url {
        Some(url) => !url.trim().is_empty() && url != RELAY_URL_PLACEHOLDER,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.news_api_key.is_none());
        assert_eq!(config.relay_url.as_deref(), Some(RELAY_URL_PLACEHOLDER));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.news_api_key = Some("abc123".to_string());
        config.relay_url = Some("https://relay.example.com/chat".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.news_api_key.as_deref(), Some("abc123"));
        assert_eq!(loaded.relay_url.as_deref(), Some("https://relay.example.com/chat"));
    }

    #[test]
    fn test_relay_placeholder_counts_as_unconfigured() {
        assert!(!relay_is_configured(None));
        assert!(!relay_is_configured(Some("")));
        assert!(!relay_is_configured(Some("   ")));
        assert!(!relay_is_configured(Some(RELAY_URL_PLACEHOLDER)));
        assert!(relay_is_configured(Some("https://relay.example.com/chat")));
    }
}

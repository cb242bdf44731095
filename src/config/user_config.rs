//! User-level settings for marketscore
//!
//! Supports loading settings from:
//! - Environment variables
//! - ~/.config/marketscore/config.toml

use super::store::FileStore;
use super::targets::{normalize_marketplace_id, GLOBAL_DEFAULT_MARKETPLACE};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the default marketplace
pub const MARKETPLACE_ENV: &str = "MARKETSCORE_MARKETPLACE";

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    /// Marketplace used when a command or record doesn't name one
    pub default_marketplace: Option<String>,

    /// Directory holding the ideal-target overrides
    pub storage_dir: Option<PathBuf>,
}

impl UserConfig {
    /// Load settings from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/marketscore/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(user_config) = Self::user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|content| Self::from_toml_str(&content).ok())
        {
            config.merge(user_config);
        }

        if let Ok(marketplace) = std::env::var(MARKETPLACE_ENV) {
            if !marketplace.trim().is_empty() {
                config.default_marketplace = Some(marketplace);
            }
        }

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("marketscore").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        if other.default_marketplace.is_some() {
            self.default_marketplace = other.default_marketplace;
        }
        if other.storage_dir.is_some() {
            self.storage_dir = other.storage_dir;
        }
    }

    /// Normalized default marketplace id
    pub fn default_marketplace(&self) -> String {
        self.default_marketplace
            .as_deref()
            .map(normalize_marketplace_id)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| GLOBAL_DEFAULT_MARKETPLACE.to_string())
    }

    /// Directory for override storage
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(FileStore::default_dir)
    }

    /// Create the user config file with commented example settings
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# marketscore user configuration

# Marketplace used when none is given (us, uk, de, fr, es, it, ca, au)
# default_marketplace = "us"

# Where ideal-target overrides are stored
# storage_dir = "/path/to/dir"
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}

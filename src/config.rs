use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::llm::client::DEFAULT_API_URL;

pub const DEFAULT_PORT: u16 = 5000;

/// Environment variables checked for an API key, in order
const API_KEY_VARS: &[&str] = &["DOCQUIZ_API_KEY", "GROQ_API_KEY", "OPENAI_API_KEY"];

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub default_model: Option<String>,
    pub port: Option<u16>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not determine config directory")?;
        Ok(base.join("docquiz"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to file with secure permissions (600)
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Config path has no parent directory"))?;

        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, &content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        // Owner read/write only, the file holds an API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)
                .with_context(|| "Failed to set config file permissions")?;
        }

        Ok(())
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.get_api_key().is_some()
    }

    /// Get the API key, checking environment variables as fallback
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key.clone().filter(|k| !k.is_empty()).or_else(|| {
            API_KEY_VARS
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(|k| !k.is_empty()))
        })
    }

    /// Chat-completions endpoint: config file, then `DOCQUIZ_API_URL`, then Groq
    pub fn api_url(&self) -> String {
        self.api_url
            .clone()
            .filter(|u| !u.is_empty())
            .or_else(|| std::env::var("DOCQUIZ_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Port for `serve`: config file, then `PORT`, then 5000
    pub fn port(&self) -> u16 {
        self.port
            .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            api_key: Some("gsk_test".to_string()),
            api_url: Some("http://localhost:8080/v1/chat/completions".to_string()),
            default_model: Some("openai/gpt-oss-20b".to_string()),
            port: Some(8088),
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.port(), 8088);
        assert_eq!(loaded.api_url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(loaded.get_api_key().as_deref(), Some("gsk_test"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}

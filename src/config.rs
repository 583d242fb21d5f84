//! Configuration Management
//!
//! Handles persistent configuration storage for armkit.

use crate::arm::client::{PollSettings, DEFAULT_ENDPOINT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Default subscription ID
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Resource Manager endpoint, for sovereign clouds
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
    /// Last resource group used on the command line
    #[serde(default)]
    pub last_resource_group: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("armkit").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific file; missing or unreadable files give defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective subscription (CLI > config > AZURE_SUBSCRIPTION_ID)
    pub fn effective_subscription(&self, cli: Option<&str>) -> Option<String> {
        self.subscription_from(cli, std::env::var("AZURE_SUBSCRIPTION_ID").ok())
    }

    /// Blank values at any level fall through to the next one
    fn subscription_from(&self, cli: Option<&str>, env: Option<String>) -> Option<String> {
        let present = |s: &String| !s.trim().is_empty();
        cli.map(str::to_string)
            .filter(present)
            .or_else(|| self.subscription_id.clone().filter(present))
            .or_else(|| env.filter(present))
    }

    pub fn effective_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Poll settings with configured overrides applied
    pub fn poll_settings(&self) -> PollSettings {
        let defaults = PollSettings::default();
        PollSettings {
            interval: self
                .poll_interval_secs
                .map(|secs| Duration::from_secs(secs.max(1)))
                .unwrap_or(defaults.interval),
            timeout: self
                .poll_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Set subscription and save
    pub fn set_subscription(&mut self, subscription_id: &str) -> Result<()> {
        self.subscription_id = Some(subscription_id.to_string());
        self.save()
    }

    /// Remember the resource group and save
    pub fn set_last_resource_group(&mut self, resource_group: &str) -> Result<()> {
        if self.last_resource_group.as_deref() == Some(resource_group) {
            return Ok(());
        }
        self.last_resource_group = Some(resource_group.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("armkit-test-{}-{}", name, uuid::Uuid::new_v4()))
            .join("config.json")
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(&temp_path("missing"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let config = Config {
            subscription_id: Some("sub-1".to_string()),
            poll_interval_secs: Some(2),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.poll_settings().interval, Duration::from_secs(2));
        assert_eq!(loaded.poll_settings().timeout, PollSettings::default().timeout);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_cli_subscription_wins() {
        let config = Config {
            subscription_id: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.effective_subscription(Some("from-cli")).as_deref(),
            Some("from-cli")
        );
        assert_eq!(
            config.effective_subscription(None).as_deref(),
            Some("from-config")
        );
        assert_eq!(config.effective_endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_blank_subscription_falls_through() {
        let config = Config {
            subscription_id: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.subscription_from(Some(""), None).as_deref(),
            Some("from-config")
        );

        let blank = Config {
            subscription_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            blank
                .subscription_from(Some(""), Some("from-env".to_string()))
                .as_deref(),
            Some("from-env")
        );
        assert_eq!(blank.subscription_from(None, Some(String::new())), None);
    }

    #[test]
    fn test_zero_poll_interval_is_raised() {
        let config = Config {
            poll_interval_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(config.poll_settings().interval, Duration::from_secs(1));
    }
}

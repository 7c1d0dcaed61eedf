//! Configuration management for rbxsync

pub mod schema;

pub use schema::{Config, SharedConfig, StoreConfig, SyncConfig, WatchConfig};

use crate::cli::args::OverrideArgs;
use crate::error::{SyncError, SyncResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default project-local config file name
pub const CONFIG_FILE: &str = "rbxsync.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with the project-local default path
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(CONFIG_FILE),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub async fn load(&self) -> SyncResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> SyncResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SyncError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| SyncError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> SyncResult<()> {
        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            SyncError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Apply CLI flag overrides on top of file/default values
    pub fn apply_overrides(&mut self, overrides: &OverrideArgs) {
        if let Some(ref path) = overrides.path {
            self.sync.search_path = path.clone();
        }
        if let Some(ref cache) = overrides.cache {
            self.sync.cache_path = cache.clone();
        }
        if let Some(ref output) = overrides.output {
            self.sync.output_path = output.clone();
        }
        if overrides.bleed {
            self.sync.bleed = true;
        }
        if let Some(ref repo) = overrides.repo {
            self.shared.repo = Some(repo.clone());
        }
        if let Some(ref branch) = overrides.branch {
            self.shared.branch = branch.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("missing.toml"));

        let config = manager.load().await.unwrap();
        assert_eq!(config.sync.search_path, PathBuf::from("assets"));
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("rbxsync.toml"));

        let mut config = Config::default();
        config.sync.bleed = true;
        config.shared.repo = Some("acme/assets".to_string());

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert!(loaded.sync.bleed);
        assert_eq!(loaded.shared.repo.as_deref(), Some("acme/assets"));
    }

    #[tokio::test]
    async fn invalid_toml_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rbxsync.toml");
        tokio::fs::write(&path, "sync = \"not a table\"").await.unwrap();

        let manager = ConfigManager::with_path(path);
        assert!(matches!(
            manager.load().await,
            Err(SyncError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn overrides_take_precedence() {
        let mut config = Config::default();
        let overrides = OverrideArgs {
            path: Some(PathBuf::from("art")),
            cache: None,
            output: Some(PathBuf::from("generated/assets.ts")),
            bleed: true,
            repo: Some("acme/assets".to_string()),
            branch: None,
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.sync.search_path, PathBuf::from("art"));
        assert_eq!(config.sync.cache_path, PathBuf::from(".rbxsync-cache.json"));
        assert_eq!(config.sync.output_path, PathBuf::from("generated/assets.ts"));
        assert!(config.sync.bleed);
        assert_eq!(config.shared.repo.as_deref(), Some("acme/assets"));
        assert_eq!(config.shared.branch, "main");
    }
}

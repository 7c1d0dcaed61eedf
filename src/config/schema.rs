//! Configuration schema for rbxsync
//!
//! Loaded from a project-local `rbxsync.toml` when present; every field has
//! a default so the file is optional. Secrets (`ROBLOX_API_KEY`,
//! `GITHUB_TOKEN`) are read from the environment only and never appear here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sync engine settings
    pub sync: SyncConfig,

    /// Content store settings
    pub store: StoreConfig,

    /// Shared map settings
    pub shared: SharedConfig,

    /// Watch mode settings
    pub watch: WatchConfig,
}

/// Sync engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory scanned for asset files
    pub search_path: PathBuf,

    /// Fingerprint → asset id cache file
    pub cache_path: PathBuf,

    /// Generated asset map module
    pub output_path: PathBuf,

    /// Alpha-bleed images before upload
    pub bleed: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            search_path: PathBuf::from("assets"),
            cache_path: PathBuf::from(".rbxsync-cache.json"),
            output_path: PathBuf::from("assetMap.ts"),
            bleed: false,
        }
    }
}

/// Content store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Assets API base URL
    pub base_url: String,

    /// Creator user id (used when no group id is set)
    pub user_id: Option<String>,

    /// Creator group id (takes precedence over user id)
    pub group_id: Option<String>,

    /// Delay between operation polls, milliseconds
    pub poll_delay_ms: u64,

    /// Poll retry budget
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://apis.roblox.com/assets/v1".to_string(),
            user_id: None,
            group_id: None,
            poll_delay_ms: 3000,
            max_retries: 3,
        }
    }
}

/// Shared map settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedConfig {
    /// Repository in `owner/repo` form; shared map disabled when unset
    pub repo: Option<String>,

    /// Branch holding the map
    pub branch: String,

    /// Path of the map document inside the repository
    pub map_path: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            repo: None,
            branch: "main".to_string(),
            map_path: "rbxsync-map.json".to_string(),
        }
    }
}

/// Watch mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period after the last change before reconciliation runs
    pub debounce_ms: u64,

    /// Hard cap on the final reconciliation pass at shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 2000,
            shutdown_timeout_secs: 30,
        }
    }
}

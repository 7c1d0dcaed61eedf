//! Error types for rbxsync
//!
//! All modules use `SyncResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rbxsync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// All errors that can occur in rbxsync
#[derive(Error, Debug)]
pub enum SyncError {
    // Credential / configuration errors
    #[error("{name} environment variable is not set")]
    MissingCredential { name: &'static str },

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Content store errors
    #[error("Upload rejected with status {status}: {body}")]
    UploadFailed { status: u16, body: String },

    #[error("Max retries exceeded while polling operation {operation}")]
    RetriesExhausted { operation: String },

    // Shared map errors
    #[error("Shared map error: {0}")]
    SharedMap(String),

    // Local state errors
    #[error("Cache file at {path} is not a valid JSON object: {reason}")]
    CorruptCache { path: PathBuf, reason: String },

    #[error("Invalid asset id: {0}. Asset id must be numeric.")]
    InvalidAssetId(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Watch path does not exist: {0}")]
    WatchPathMissing(PathBuf),

    // Transform errors
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("ffmpeg exited with code {code}: {stderr}")]
    FfmpegFailed { code: i32, stderr: String },

    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Upstream libraries
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl SyncError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Whether this error means required credentials/configuration are absent.
    ///
    /// These failures disable local persistence for the rest of the run so a
    /// half-configured invocation cannot clobber a good cache.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. } | Self::ConfigInvalid { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingCredential {
                name: "ROBLOX_API_KEY",
            } => Some("Create an Open Cloud API key and export ROBLOX_API_KEY"),
            Self::MissingCredential {
                name: "GITHUB_TOKEN",
            } => Some("Export GITHUB_TOKEN with contents read/write access"),
            Self::InvalidAssetId(_) => {
                Some("Pass the numeric id, e.g. rbxsync add icon.png 12345678")
            }
            _ => None,
        }
    }
}

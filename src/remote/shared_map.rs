//! GitHub-hosted shared map
//!
//! The shared map is a JSON document committed to a repository via the
//! contents API. Fetch failures degrade to an empty map so a broken or
//! unreachable repo never blocks a sync run; local state stays
//! authoritative.

use crate::error::{SyncError, SyncResult};
use crate::remote::{SharedMap, SharedMapStore};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const TOKEN_ENV: &str = "GITHUB_TOKEN";
const API_ROOT: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("rbxsync/", env!("CARGO_PKG_VERSION"));

/// Shared map client backed by the GitHub contents API
pub struct GitHubSharedMap {
    client: reqwest::Client,
    repo: String,
    branch: String,
    map_path: String,
}

#[derive(Debug, Deserialize)]
struct ContentsMeta {
    sha: String,
}

impl GitHubSharedMap {
    pub fn new(repo: impl Into<String>, branch: impl Into<String>, map_path: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            repo: repo.into(),
            branch: branch.into(),
            map_path: map_path.into(),
        }
    }

    fn token() -> SyncResult<String> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(SyncError::MissingCredential { name: TOKEN_ENV }),
        }
    }

    fn contents_url(&self) -> String {
        format!(
            "{API_ROOT}/repos/{}/contents/{}?ref={}",
            self.repo, self.map_path, self.branch
        )
    }

    /// Read the current blob SHA, required to update an existing file.
    /// Any failure is treated as "file absent".
    async fn current_sha(&self, token: &str) -> Option<String> {
        let response = self
            .client
            .get(self.contents_url())
            .bearer_auth(token)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response
            .json::<ContentsMeta>()
            .await
            .ok()
            .map(|meta| meta.sha)
    }
}

#[async_trait]
impl SharedMapStore for GitHubSharedMap {
    async fn fetch(&self) -> SyncResult<SharedMap> {
        let token = Self::token()?;

        let response = match self
            .client
            .get(self.contents_url())
            .bearer_auth(&token)
            .header("User-Agent", USER_AGENT)
            // Raw media type: the body is the JSON document itself
            .header("Accept", "application/vnd.github.raw+json")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to fetch shared map from {}: {e}", self.repo);
                return Ok(SharedMap::new());
            }
        };

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("No shared map at {}/{} yet", self.repo, self.map_path);
            return Ok(SharedMap::new());
        }
        if !response.status().is_success() {
            warn!(
                "Failed to fetch shared map from {}: {}",
                self.repo,
                response.status()
            );
            return Ok(SharedMap::new());
        }

        match response.json::<SharedMap>().await {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!("Shared map at {}/{} is not valid JSON: {e}", self.repo, self.map_path);
                Ok(SharedMap::new())
            }
        }
    }

    async fn publish(&self, map: &SharedMap, commit_message: &str) -> SyncResult<()> {
        let token = Self::token()?;
        let content = serde_json::to_string_pretty(map)?;

        let mut body = serde_json::json!({
            "message": commit_message,
            "content": BASE64.encode(content.as_bytes()),
            "branch": self.branch,
        });
        if let Some(sha) = self.current_sha(&token).await {
            body["sha"] = serde_json::Value::String(sha);
        }

        let response = self
            .client
            .put(format!(
                "{API_ROOT}/repos/{}/contents/{}",
                self.repo, self.map_path
            ))
            .bearer_auth(&token)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::SharedMap(format!(
                "publish to {} failed: {} {}",
                self.repo,
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        debug!("Pushed {} to {}", self.map_path, self.repo);
        Ok(())
    }
}

//! Roblox Open Cloud content store client
//!
//! Uploads go through a multipart create-asset call that returns an
//! operation path; the operation is then polled with a fixed delay until it
//! reports done. The retry budget is asymmetric on purpose: a failed poll
//! request consumes one unit, a healthy "not yet done" response does not.

use crate::config::schema::StoreConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::ContentStore;
use crate::store::AssetId;
use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_ENV: &str = "ROBLOX_API_KEY";
const UPLOAD_DESCRIPTION: &str = "Uploaded via rbxsync";

/// HTTP client for the assets API
pub struct RobloxContentStore {
    client: reqwest::Client,
    base_url: String,
    user_id: Option<String>,
    group_id: Option<String>,
    poll_delay: Duration,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct OperationHandle {
    path: String,
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    #[serde(rename = "assetId")]
    asset_id: Option<String>,
}

/// Result of one poll attempt, fed into the budgeted loop
enum PollOutcome {
    /// Request failed or returned non-success: consumes budget
    RequestFailed,
    /// Healthy response, operation still in progress: budget refunded
    NotDone,
    /// Operation finished; `None` means unsupported content category
    Done(Option<AssetId>),
}

impl RobloxContentStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            group_id: config.group_id.clone(),
            poll_delay: Duration::from_millis(config.poll_delay_ms),
            max_retries: config.max_retries,
        }
    }

    fn api_key() -> SyncResult<String> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(SyncError::MissingCredential { name: API_KEY_ENV }),
        }
    }

    fn creator(&self) -> serde_json::Value {
        match (&self.group_id, &self.user_id) {
            (Some(group), _) => serde_json::json!({ "groupId": group }),
            (None, Some(user)) => serde_json::json!({ "userId": user }),
            (None, None) => serde_json::json!({}),
        }
    }

    async fn poll_once(&self, operation: &str, key: &str) -> PollOutcome {
        let url = format!("{}/{}", self.base_url, operation);
        let response = match self
            .client
            .get(&url)
            .header("x-api-key", key)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to fetch operation {operation}: {e}");
                return PollOutcome::RequestFailed;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Failed to fetch operation {operation}: {status} {body}");
            return PollOutcome::RequestFailed;
        }

        match response.json::<OperationStatus>().await {
            Ok(status) if status.done => {
                PollOutcome::Done(status.response.and_then(|r| r.asset_id).map(AssetId::from_raw))
            }
            Ok(_) => PollOutcome::NotDone,
            Err(e) => {
                warn!("Malformed operation response for {operation}: {e}");
                PollOutcome::RequestFailed
            }
        }
    }
}

/// Drive poll attempts against a retry budget.
///
/// `RequestFailed` consumes one unit of budget; `NotDone` sleeps for `delay`
/// without consuming any. Inherited behavior, kept until a product decision
/// says otherwise.
async fn poll_loop<F, Fut>(
    operation: &str,
    max_retries: u32,
    delay: Duration,
    mut attempt: F,
) -> SyncResult<Option<AssetId>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollOutcome>,
{
    let mut budget = max_retries;
    loop {
        if budget == 0 {
            return Err(SyncError::RetriesExhausted {
                operation: operation.to_string(),
            });
        }
        budget -= 1;

        match attempt().await {
            PollOutcome::Done(id) => return Ok(id),
            PollOutcome::NotDone => {
                budget += 1;
                debug!("Operation {operation} not ready yet, retrying...");
                tokio::time::sleep(delay).await;
            }
            PollOutcome::RequestFailed => {
                debug!("Operation {operation} request failed (retries left: {budget})");
            }
        }
    }
}

fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, e)| e).unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "fbx" => "model/fbx",
        _ => "application/octet-stream",
    }
}

fn asset_type_for(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, e)| e).unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "mp3" | "ogg" => "Audio",
        "fbx" => "Model",
        // png/jpg/jpeg and anything unknown
        _ => "Decal",
    }
}

#[async_trait]
impl ContentStore for RobloxContentStore {
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        display_name: &str,
    ) -> SyncResult<Option<AssetId>> {
        let key = Self::api_key()?;

        let request = serde_json::json!({
            "assetType": asset_type_for(name),
            "displayName": display_name,
            "description": UPLOAD_DESCRIPTION,
            "creationContext": { "creator": self.creator() },
        });

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(content_type_for(name))?;
        let form = reqwest::multipart::Form::new()
            .text("request", request.to_string())
            .part("fileContent", part);

        let response = self
            .client
            .post(format!("{}/assets", self.base_url))
            .header("x-api-key", &key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::UploadFailed {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let handle: OperationHandle = response.json().await?;

        // Give the store a head start before the first poll
        tokio::time::sleep(self.poll_delay).await;

        poll_loop(&handle.path, self.max_retries, self.poll_delay, || {
            self.poll_once(&handle.path, &key)
        })
        .await
    }
}

//! Remote collaborators
//!
//! The engine talks to two external systems through object-safe traits so
//! tests can substitute in-memory fakes: the content store that hosts
//! uploaded asset bytes, and the shared map that lets independent runs
//! exchange fingerprint → asset id state.

pub mod content_store;
pub mod shared_map;

pub use content_store::RobloxContentStore;
pub use shared_map::GitHubSharedMap;

use crate::error::SyncResult;
use crate::fingerprint::ContentFingerprint;
use crate::store::AssetId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Remote binary-asset store with upload/poll semantics
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload content and wait for processing to finish.
    ///
    /// Returns `Ok(None)` when the store accepted the request but produced
    /// no asset (unsupported content category).
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        display_name: &str,
    ) -> SyncResult<Option<AssetId>>;
}

/// One externalized cache entry: fingerprint key plus where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedRecord {
    #[serde(rename = "assetId")]
    pub asset_id: AssetId,
    #[serde(rename = "filePath")]
    pub path: String,
}

/// The exchanged document: fingerprint → record
pub type SharedMap = BTreeMap<ContentFingerprint, SharedRecord>;

/// Remote versioned blob store holding the shared map
#[async_trait]
pub trait SharedMapStore: Send + Sync {
    /// Fetch the current shared map. Missing documents yield an empty map.
    async fn fetch(&self) -> SyncResult<SharedMap>;

    /// Replace the shared map wholesale
    async fn publish(&self, map: &SharedMap, commit_message: &str) -> SyncResult<()>;
}

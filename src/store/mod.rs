//! Durable local state: dedup cache and asset manifest
//!
//! Two dirty-tracked stores live here. [`CacheStore`] maps content
//! fingerprints to asset ids (flat JSON on disk). [`ManifestStore`] maps
//! local paths to asset ids and embedded text content, rendered as a
//! generated TypeScript module. Both persist only when dirty, and both are
//! gated by a run-wide persistence guard owned by [`AssetDb`].

pub mod manifest;

use crate::error::{SyncError, SyncResult};
use crate::fingerprint::ContentFingerprint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Opaque handle returned by the content store for uploaded content
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Wrap an id received from the content store or shared map
    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Parse a user-supplied id; asset ids are numeric
    pub fn parse_numeric(s: &str) -> SyncResult<Self> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(SyncError::InvalidAssetId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a local path to a `/`-separated string key
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Fingerprint → asset id dedup cache, persisted as a flat JSON object
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    entries: BTreeMap<ContentFingerprint, AssetId>,
    dirty: bool,
}

impl CacheStore {
    /// Read prior durable state if present.
    ///
    /// A missing file starts empty. A present but unreadable or invalid file
    /// is an error: the caller disables persistence rather than silently
    /// clobbering recoverable data on the next save.
    pub async fn load(path: PathBuf) -> SyncResult<Self> {
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .await
                .map_err(|e| SyncError::CorruptCache {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            serde_json::from_str::<BTreeMap<String, String>>(&raw)
                .map_err(|e| SyncError::CorruptCache {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
                .into_iter()
                .map(|(k, v)| (ContentFingerprint::from_raw(k), AssetId::from_raw(v)))
                .collect()
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    pub fn get(&self, fingerprint: &ContentFingerprint) -> Option<&AssetId> {
        self.entries.get(fingerprint)
    }

    /// Insert an entry. No-op (does not dirty) when the value is unchanged.
    pub fn set(&mut self, fingerprint: ContentFingerprint, id: AssetId) {
        if self.entries.get(&fingerprint) == Some(&id) {
            return;
        }
        self.entries.insert(fingerprint, id);
        self.dirty = true;
    }

    /// Remove an entry. Dirties only if the fingerprint existed.
    pub fn remove(&mut self, fingerprint: &ContentFingerprint) {
        if self.entries.remove(fingerprint).is_some() {
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContentFingerprint, &AssetId)> {
        self.entries.iter()
    }

    /// Fingerprints whose asset id is not in `used`
    pub fn unreferenced(&self, used: &std::collections::BTreeSet<&AssetId>) -> Vec<ContentFingerprint> {
        self.entries
            .iter()
            .filter(|(_, id)| !used.contains(id))
            .map(|(fp, _)| fp.clone())
            .collect()
    }

    /// Write the full map if dirty. Returns whether a write happened.
    ///
    /// On I/O failure the dirty flag stays set so a later save retries.
    pub async fn persist(&mut self) -> SyncResult<bool> {
        if !self.dirty {
            debug!("Cache unchanged; skipping cache write");
            return Ok(false);
        }

        let plain: BTreeMap<&str, &str> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let content = serde_json::to_string_pretty(&plain)?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| SyncError::io(format!("writing cache to {}", self.path.display()), e))?;

        self.dirty = false;
        info!("Cache saved to {}", self.path.display());
        Ok(true)
    }
}

/// Path → asset id map plus embedded text content, rendered as a generated
/// TypeScript module (the consumption artifact for downstream build tooling)
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    assets: BTreeMap<String, AssetId>,
    texts: BTreeMap<String, String>,
    dirty: bool,
}

impl ManifestStore {
    /// Load prior state by parsing the previously generated module.
    ///
    /// The renderer emits one entry per line, so parsing back is exact. A
    /// file we cannot parse was edited by hand or truncated; that is an error
    /// and the caller disables persistence for the run.
    pub async fn load(path: PathBuf) -> SyncResult<Self> {
        let (assets, texts) = if path.exists() {
            let raw = fs::read_to_string(&path)
                .await
                .map_err(|e| SyncError::CorruptCache {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            manifest::parse(&raw).map_err(|reason| SyncError::CorruptCache {
                path: path.clone(),
                reason,
            })?
        } else {
            (BTreeMap::new(), BTreeMap::new())
        };

        Ok(Self {
            path,
            assets,
            texts,
            dirty: false,
        })
    }

    pub fn asset(&self, path: &Path) -> Option<&AssetId> {
        self.assets.get(&path_key(path))
    }

    pub fn text(&self, path: &Path) -> Option<&str> {
        self.texts.get(&path_key(path)).map(String::as_str)
    }

    /// Map a path to an asset id. No-op when unchanged.
    pub fn set_asset(&mut self, path: &Path, id: AssetId) {
        let key = path_key(path);
        if self.assets.get(&key) == Some(&id) {
            return;
        }
        self.assets.insert(key, id);
        self.dirty = true;
    }

    /// Adopt an already-normalized key (shared map records, library installs)
    pub fn set_asset_key(&mut self, key: String, id: AssetId) {
        if self.assets.get(&key) == Some(&id) {
            return;
        }
        self.assets.insert(key, id);
        self.dirty = true;
    }

    /// Embed text content for a path. No-op when unchanged.
    pub fn set_text(&mut self, path: &Path, content: String) {
        let key = path_key(path);
        if self.texts.get(&key) == Some(&content) {
            return;
        }
        self.texts.insert(key, content);
        self.dirty = true;
    }

    /// Drop only the asset entry for a path, leaving embedded text alone.
    /// Dirties only if an asset entry existed.
    pub fn remove_asset(&mut self, path: &Path) {
        if self.assets.remove(&path_key(path)).is_some() {
            self.dirty = true;
        }
    }

    /// Drop all entries for a path. Dirties only if something existed.
    pub fn remove(&mut self, path: &Path) {
        let key = path_key(path);
        let removed_asset = self.assets.remove(&key).is_some();
        let removed_text = self.texts.remove(&key).is_some();
        if removed_asset || removed_text {
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn assets(&self) -> &BTreeMap<String, AssetId> {
        &self.assets
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Render and write the module if dirty. Returns whether a write happened.
    pub async fn persist(&mut self) -> SyncResult<bool> {
        if !self.dirty {
            debug!("Asset map unchanged; skipping asset map write");
            return Ok(false);
        }

        let content = manifest::render(&self.assets, &self.texts);
        fs::write(&self.path, content).await.map_err(|e| {
            SyncError::io(format!("writing asset map to {}", self.path.display()), e)
        })?;

        self.dirty = false;
        info!(
            "Asset map generated with {} entries at {}",
            self.assets.len(),
            self.path.display()
        );
        Ok(true)
    }
}

/// Which store a skipped-save notice refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreKind {
    Cache,
    Manifest,
}

/// Both durable stores plus the run-wide persistence guard.
///
/// Once persistence is disabled with a reason it stays disabled until the
/// process restarts; every subsequent save is a no-op. This prevents a run
/// with broken upstream configuration from overwriting a good cache with an
/// empty or partial one.
#[derive(Debug)]
pub struct AssetDb {
    pub cache: CacheStore,
    pub manifest: ManifestStore,
    disabled_reason: Option<String>,
    skip_logged: [bool; 2],
}

impl AssetDb {
    /// Load both stores. Corrupt state disables persistence instead of
    /// starting silently empty.
    pub async fn load(cache_path: PathBuf, output_path: PathBuf) -> Self {
        let mut disabled_reason = None;

        let cache = match CacheStore::load(cache_path.clone()).await {
            Ok(store) => store,
            Err(e) => {
                error!("{e}");
                disabled_reason = Some(e.to_string());
                CacheStore {
                    path: cache_path,
                    entries: BTreeMap::new(),
                    dirty: false,
                }
            }
        };

        let manifest = match ManifestStore::load(output_path.clone()).await {
            Ok(store) => store,
            Err(e) => {
                error!("{e}");
                if disabled_reason.is_none() {
                    disabled_reason = Some(e.to_string());
                }
                ManifestStore {
                    path: output_path,
                    assets: BTreeMap::new(),
                    texts: BTreeMap::new(),
                    dirty: false,
                }
            }
        };

        if let Some(ref reason) = disabled_reason {
            warn!("Disabling cache persistence: {reason}");
        }

        Self {
            cache,
            manifest,
            disabled_reason,
            skip_logged: [false, false],
        }
    }

    /// Suppress all further persistence for this run
    pub fn disable_persistence(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if let Some(ref existing) = self.disabled_reason {
            if *existing != reason {
                debug!(
                    "Persistence already disabled ({existing}). Ignoring additional request: {reason}"
                );
            }
            return;
        }
        warn!("Disabling cache persistence: {reason}");
        self.disabled_reason = Some(reason);
    }

    pub fn persistence_disabled(&self) -> Option<&str> {
        self.disabled_reason.as_deref()
    }

    fn notify_skip(&mut self, kind: StoreKind) {
        let Some(ref reason) = self.disabled_reason else {
            return;
        };
        let label = match kind {
            StoreKind::Cache => "Cache",
            StoreKind::Manifest => "Asset map",
        };
        let message =
            format!("{label} save skipped to avoid overwriting existing data: {reason}");
        let logged = &mut self.skip_logged[kind as usize];
        if *logged {
            debug!("{message}");
        } else {
            warn!("{message}");
            *logged = true;
        }
    }

    /// Persist both stores, honoring dirty flags and the guard
    pub async fn save(&mut self) -> SyncResult<()> {
        if self.disabled_reason.is_some() {
            self.notify_skip(StoreKind::Cache);
            self.notify_skip(StoreKind::Manifest);
            return Ok(());
        }

        self.cache.persist().await?;
        self.manifest.persist().await?;
        Ok(())
    }
}

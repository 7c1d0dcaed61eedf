//! Sync orchestration
//!
//! [`SyncEngine`] owns the durable state and the content store client and
//! drives the per-file sync flow: classify, fingerprint, cache lookup,
//! transform + upload on miss, map updates. Files are processed strictly
//! sequentially; uploads have side effects that must not race the maps.

use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::fingerprint::{ContentFingerprint, Qualifier};
use crate::remote::ContentStore;
use crate::store::{path_key, AssetDb, AssetId};
use crate::transform::{self, AssetKind};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Display names longer than this are truncated before upload
pub const MAX_DISPLAY_NAME_LENGTH: usize = 50;

const ELLIPSIS: &str = "...";

/// Sync orchestrator: one instance per run, no ambient global state
pub struct SyncEngine {
    db: AssetDb,
    store: Box<dyn ContentStore>,
    search_path: PathBuf,
    bleed: bool,
}

impl SyncEngine {
    pub fn new(db: AssetDb, store: Box<dyn ContentStore>, config: &Config) -> Self {
        Self {
            db,
            store,
            search_path: config.sync.search_path.clone(),
            bleed: config.sync.bleed,
        }
    }

    pub fn db(&self) -> &AssetDb {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut AssetDb {
        &mut self.db
    }

    pub fn search_path(&self) -> &Path {
        &self.search_path
    }

    /// Synchronize every file under the search path once, then persist.
    ///
    /// Per-file failures are logged and do not abort the run.
    pub async fn sync_all(&mut self) -> SyncResult<()> {
        let files = discover_files(&self.search_path).await?;
        for file in files {
            if let Err(e) = self.sync_one(&file).await {
                error!("Failed to sync {}: {e}", file.display());
            }
        }
        self.save().await
    }

    /// Synchronize a single file.
    ///
    /// Text files are embedded into the asset map and never uploaded. For
    /// binary files, a cache hit reuses the stored asset id with zero remote
    /// calls; a miss transforms and uploads. Upload failures leave both maps
    /// untouched; a missing-credential failure additionally disables
    /// persistence for the rest of the run.
    pub async fn sync_one(&mut self, path: &Path) -> SyncResult<Option<AssetId>> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| SyncError::io(format!("reading {}", path.display()), e))?;

        let kind = AssetKind::classify(path);
        if kind == AssetKind::Text {
            let content = String::from_utf8_lossy(&bytes).into_owned();
            // Only a stale asset entry goes; set_text no-ops on unchanged
            // content so re-syncing the same text stays clean
            self.db.manifest.remove_asset(path);
            self.db.manifest.set_text(path, content);
            debug!("Embedded {} as text content", path.display());
            return Ok(None);
        }

        let quals = transform::qualifiers(kind, self.bleed);
        let fingerprint = ContentFingerprint::of(&bytes, &quals);

        if let Some(id) = self.db.cache.get(&fingerprint).cloned() {
            info!("{} reused rbxassetid://{id}", path.display());
            self.db.manifest.set_asset(path, id.clone());
            return Ok(Some(id));
        }

        match self.upload_new(path, bytes, kind, &quals).await {
            Ok(Some(id)) => {
                info!("Uploaded {} -> rbxassetid://{id}", path.display());
                self.db.cache.set(fingerprint, id.clone());
                self.db.manifest.set_asset(path, id.clone());
                Ok(Some(id))
            }
            Ok(None) => {
                warn!("Skipping {} due to unsupported file type", path.display());
                Ok(None)
            }
            Err(e) => {
                error!("Failed to upload {}: {e}", path.display());
                if e.is_configuration() {
                    self.db.disable_persistence(format!(
                        "Missing Roblox configuration ({e}). Cache will remain untouched."
                    ));
                }
                Ok(None)
            }
        }
    }

    async fn upload_new(
        &self,
        path: &Path,
        mut bytes: Vec<u8>,
        kind: AssetKind,
        quals: &[Qualifier],
    ) -> SyncResult<Option<AssetId>> {
        let normalized = self.normalized_asset_path(path);
        let display_name = truncate_display_name(&normalized);
        if display_name != normalized {
            debug!("Display name truncated for upload: \"{normalized}\" -> \"{display_name}\"");
        }

        if quals.contains(&Qualifier::Bleed) {
            bytes = transform::bleed::bleed_alpha(&bytes)?;
        }
        if kind == AssetKind::WavAudio {
            bytes = transform::audio::convert_wav_to_ogg(&bytes).await?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let upload_name = transform::upload_name(&file_name, kind);

        self.store.upload(&upload_name, bytes, &display_name).await
    }

    /// Remove the path entry for a deleted file.
    ///
    /// The cache entry survives: the same content may resurface under
    /// another path, here or on another machine.
    pub fn unlink(&mut self, path: &Path) {
        self.db.manifest.remove(path);
    }

    /// Map a path to a known asset id without uploading
    pub async fn add_manual(&mut self, path: &Path, raw_id: &str) -> SyncResult<()> {
        let path = std::path::absolute(path)
            .map_err(|e| SyncError::io(format!("resolving {}", path.display()), e))?;
        if !path.exists() {
            return Err(SyncError::FileNotFound(path));
        }
        let id = AssetId::parse_numeric(raw_id)?;

        let bytes = fs::read(&path)
            .await
            .map_err(|e| SyncError::io(format!("reading {}", path.display()), e))?;
        let kind = AssetKind::classify(&path);
        let quals = transform::qualifiers(kind, self.bleed);
        let fingerprint = ContentFingerprint::of(&bytes, &quals);

        self.db.cache.set(fingerprint, id.clone());
        self.db.manifest.set_asset(&path, id.clone());
        info!("Manually added {} -> rbxassetid://{id}", path.display());

        self.save().await
    }

    /// Drop cache fingerprints whose asset id no path entry references
    pub fn clean_cache(&mut self) {
        let used: BTreeSet<&AssetId> = self.db.manifest.assets().values().collect();
        let unused = self.db.cache.unreferenced(&used);
        drop(used);

        for fingerprint in &unused {
            self.db.cache.remove(fingerprint);
        }

        if unused.is_empty() {
            info!("No unused asset ids found in cache");
        } else {
            info!("Cleaned up {} unused asset ids from cache", unused.len());
        }
    }

    /// Persist both maps, honoring dirty flags and the persistence guard
    pub async fn save(&mut self) -> SyncResult<()> {
        self.db.save().await
    }

    /// Asset path relative to the search root, prefixed with the root's
    /// basename and `/`-separated. Files outside the root keep their given
    /// path, normalized.
    fn normalized_asset_path(&self, path: &Path) -> String {
        let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let root = std::path::absolute(&self.search_path)
            .unwrap_or_else(|_| self.search_path.clone());
        let base = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path_key(&root));

        match abs.strip_prefix(&root) {
            Ok(rel) if rel.as_os_str().is_empty() => base,
            Ok(rel) => format!("{base}/{}", path_key(rel)),
            Err(_) => path_key(path),
        }
    }
}

/// Truncate a display name to the store's limit, keeping the tail and
/// prefixing an ellipsis marker. The result is recognizable but not unique.
pub fn truncate_display_name(normalized: &str) -> String {
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() <= MAX_DISPLAY_NAME_LENGTH {
        return normalized.to_string();
    }

    let tail_len = MAX_DISPLAY_NAME_LENGTH - ELLIPSIS.len();
    let tail: String = chars[chars.len() - tail_len..].iter().collect();
    format!("{ELLIPSIS}{tail}")
}

/// Recursively collect all files under a directory, sorted for stable order.
///
/// The walk itself is synchronous directory iteration, so it runs on the
/// blocking pool rather than stalling the runtime on large trees.
pub async fn discover_files(root: &Path) -> SyncResult<Vec<PathBuf>> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || walk_files(&root))
        .await
        .map_err(|e| SyncError::io("joining directory walk", std::io::Error::other(e)))?
}

fn walk_files(root: &Path) -> SyncResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(SyncError::WatchPathMissing(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| SyncError::io(format!("reading directory {}", dir.display()), e))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| SyncError::io(format!("reading entry in {}", dir.display()), e))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::ContentStore;
    use async_trait::async_trait;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// In-memory content store counting uploads
    struct MockStore {
        uploads: AtomicUsize,
        next_id: AtomicU64,
        mode: MockMode,
    }

    enum MockMode {
        Succeed,
        Unsupported,
        MissingCredential,
    }

    impl MockStore {
        fn new() -> Self {
            Self::with_mode(MockMode::Succeed)
        }

        fn with_mode(mode: MockMode) -> Self {
            Self {
                uploads: AtomicUsize::new(0),
                next_id: AtomicU64::new(1000),
                mode,
            }
        }
    }

    #[async_trait]
    impl ContentStore for MockStore {
        async fn upload(
            &self,
            _name: &str,
            _bytes: Vec<u8>,
            _display_name: &str,
        ) -> SyncResult<Option<AssetId>> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            match self.mode {
                MockMode::Succeed => {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(AssetId::from_raw(id.to_string())))
                }
                MockMode::Unsupported => Ok(None),
                MockMode::MissingCredential => Err(SyncError::MissingCredential {
                    name: "ROBLOX_API_KEY",
                }),
            }
        }
    }

    struct Fixture {
        temp: TempDir,
        uploads: std::sync::Arc<MockStore>,
    }

    // MockStore behind Arc so tests can read counters after the engine
    // takes ownership of the boxed trait object.
    struct SharedMock(std::sync::Arc<MockStore>);

    #[async_trait]
    impl ContentStore for SharedMock {
        async fn upload(
            &self,
            name: &str,
            bytes: Vec<u8>,
            display_name: &str,
        ) -> SyncResult<Option<AssetId>> {
            self.0.upload(name, bytes, display_name).await
        }
    }

    async fn engine_with(temp: &TempDir, store: std::sync::Arc<MockStore>, bleed: bool) -> SyncEngine {
        let mut config = Config::default();
        config.sync.search_path = temp.path().join("assets");
        config.sync.cache_path = temp.path().join("cache.json");
        config.sync.output_path = temp.path().join("assetMap.ts");
        config.sync.bleed = bleed;

        let db = AssetDb::load(
            config.sync.cache_path.clone(),
            config.sync.output_path.clone(),
        )
        .await;
        SyncEngine::new(db, Box::new(SharedMock(store)), &config)
    }

    async fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("assets")).unwrap();
        Fixture {
            temp,
            uploads: std::sync::Arc::new(MockStore::new()),
        }
    }

    fn write_asset(fx: &Fixture, name: &str, bytes: &[u8]) -> PathBuf {
        let path = fx.temp.path().join("assets").join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn tiny_png() -> Vec<u8> {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn idempotence_second_sync_makes_no_remote_calls() {
        let fx = fixture().await;
        let path = write_asset(&fx, "a.png", b"pngbytes");
        let mut engine = engine_with(&fx.temp, fx.uploads.clone(), false).await;

        let first = engine.sync_one(&path).await.unwrap().unwrap();
        let second = engine.sync_one(&path).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(fx.uploads.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(engine.db().manifest.asset(&path), Some(&first));
    }

    #[tokio::test]
    async fn dedup_identical_content_shares_one_id() {
        let fx = fixture().await;
        let a = write_asset(&fx, "a.png", b"same-bytes");
        let b = write_asset(&fx, "b.png", b"same-bytes");
        let mut engine = engine_with(&fx.temp, fx.uploads.clone(), false).await;

        let id_a = engine.sync_one(&a).await.unwrap().unwrap();
        let id_b = engine.sync_one(&b).await.unwrap().unwrap();

        assert_eq!(id_a, id_b);
        assert_eq!(fx.uploads.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(engine.db().manifest.asset_count(), 2);
    }

    #[tokio::test]
    async fn transform_sensitivity_bleed_changes_fingerprint() {
        let fx = fixture().await;
        let path = write_asset(&fx, "a.png", &tiny_png());

        let mut plain = engine_with(&fx.temp, fx.uploads.clone(), false).await;
        plain.sync_one(&path).await.unwrap().unwrap();
        plain.save().await.unwrap();
        assert_eq!(fx.uploads.uploads.load(Ordering::SeqCst), 1);

        // Same file, bleed enabled, same durable cache: distinct fingerprint
        // forces a fresh upload.
        let mut bled = engine_with(&fx.temp, fx.uploads.clone(), true).await;
        bled.sync_one(&path).await.unwrap().unwrap();
        assert_eq!(fx.uploads.uploads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn scenario_a_empty_directory() {
        let fx = fixture().await;
        let mut engine = engine_with(&fx.temp, fx.uploads.clone(), false).await;

        engine.sync_all().await.unwrap();

        assert_eq!(fx.uploads.uploads.load(Ordering::SeqCst), 0);
        assert!(!fx.temp.path().join("cache.json").exists());
        assert!(!fx.temp.path().join("assetMap.ts").exists());
    }

    #[tokio::test]
    async fn scenario_b_new_file_then_clean_rerun() {
        let fx = fixture().await;
        write_asset(&fx, "a.png", b"fresh");

        let mut engine = engine_with(&fx.temp, fx.uploads.clone(), false).await;
        engine.sync_all().await.unwrap();

        assert_eq!(fx.uploads.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(engine.db().cache.len(), 1);
        assert_eq!(engine.db().manifest.asset_count(), 1);
        let cache_before = std::fs::read_to_string(fx.temp.path().join("cache.json")).unwrap();
        let map_before = std::fs::read_to_string(fx.temp.path().join("assetMap.ts")).unwrap();

        // Fresh process: reload durable state, new counters. Nothing dirties,
        // nothing uploads, nothing rewrites.
        let rerun_store = std::sync::Arc::new(MockStore::new());
        let mut rerun = engine_with(&fx.temp, rerun_store.clone(), false).await;
        rerun.sync_all().await.unwrap();

        assert_eq!(rerun_store.uploads.load(Ordering::SeqCst), 0);
        assert!(!rerun.db().cache.is_dirty());
        assert!(!rerun.db().manifest.is_dirty());
        assert_eq!(
            std::fs::read_to_string(fx.temp.path().join("cache.json")).unwrap(),
            cache_before
        );
        assert_eq!(
            std::fs::read_to_string(fx.temp.path().join("assetMap.ts")).unwrap(),
            map_before
        );
    }

    #[tokio::test]
    async fn scenario_c_unlink_keeps_cache_entry() {
        let fx = fixture().await;
        let path = write_asset(&fx, "a.png", b"doomed");
        let mut engine = engine_with(&fx.temp, fx.uploads.clone(), false).await;
        engine.sync_all().await.unwrap();

        std::fs::remove_file(&path).unwrap();
        engine.unlink(&path);

        assert!(engine.db().manifest.is_dirty());
        assert!(!engine.db().cache.is_dirty());
        assert_eq!(engine.db().manifest.asset_count(), 0);
        assert_eq!(engine.db().cache.len(), 1);
    }

    #[tokio::test]
    async fn unsupported_type_creates_no_entries() {
        let fx = fixture().await;
        let path = write_asset(&fx, "a.blend", b"whatever");
        let store = std::sync::Arc::new(MockStore::with_mode(MockMode::Unsupported));
        let mut engine = engine_with(&fx.temp, store.clone(), false).await;

        let result = engine.sync_one(&path).await.unwrap();

        assert!(result.is_none());
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(engine.db().cache.len(), 0);
        assert_eq!(engine.db().manifest.asset_count(), 0);
    }

    #[tokio::test]
    async fn missing_credential_disables_persistence() {
        let fx = fixture().await;
        let path = write_asset(&fx, "a.png", b"locked-out");
        let store = std::sync::Arc::new(MockStore::with_mode(MockMode::MissingCredential));
        let mut engine = engine_with(&fx.temp, store, false).await;

        let result = engine.sync_one(&path).await.unwrap();

        assert!(result.is_none());
        assert_eq!(engine.db().cache.len(), 0);
        assert!(engine.db().persistence_disabled().is_some());

        engine.save().await.unwrap();
        assert!(!fx.temp.path().join("cache.json").exists());
    }

    #[tokio::test]
    async fn text_file_embedded_not_uploaded() {
        let fx = fixture().await;
        let path = write_asset(&fx, "notes.md", b"# Heading\nbody");
        let mut engine = engine_with(&fx.temp, fx.uploads.clone(), false).await;

        let result = engine.sync_one(&path).await.unwrap();

        assert!(result.is_none());
        assert_eq!(fx.uploads.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(engine.db().manifest.text(&path), Some("# Heading\nbody"));
        assert!(engine.db().manifest.asset(&path).is_none());
    }

    #[tokio::test]
    async fn text_rerun_leaves_manifest_clean() {
        let fx = fixture().await;
        let path = write_asset(&fx, "notes.md", b"# Heading\nbody");
        let mut engine = engine_with(&fx.temp, fx.uploads.clone(), false).await;

        engine.sync_one(&path).await.unwrap();
        engine.save().await.unwrap();
        let map_before = std::fs::read_to_string(fx.temp.path().join("assetMap.ts")).unwrap();

        engine.sync_one(&path).await.unwrap();
        assert!(!engine.db().manifest.is_dirty());

        engine.save().await.unwrap();
        assert_eq!(
            std::fs::read_to_string(fx.temp.path().join("assetMap.ts")).unwrap(),
            map_before
        );
    }

    #[tokio::test]
    async fn add_manual_validates_and_maps() {
        let fx = fixture().await;
        let path = write_asset(&fx, "a.png", b"manual");
        let mut engine = engine_with(&fx.temp, fx.uploads.clone(), false).await;

        assert!(engine.add_manual(&path, "12ab").await.is_err());
        assert!(engine
            .add_manual(&fx.temp.path().join("assets/nope.png"), "123")
            .await
            .is_err());

        engine.add_manual(&path, "424242").await.unwrap();
        assert_eq!(fx.uploads.uploads.load(Ordering::SeqCst), 0);
        assert_eq!(engine.db().cache.len(), 1);
        assert!(fx.temp.path().join("cache.json").exists());
    }

    #[tokio::test]
    async fn clean_cache_drops_only_unreferenced() {
        let fx = fixture().await;
        let path = write_asset(&fx, "a.png", b"keep-me");
        let mut engine = engine_with(&fx.temp, fx.uploads.clone(), false).await;
        engine.sync_one(&path).await.unwrap();

        engine
            .db_mut()
            .cache
            .set(ContentFingerprint::from_raw("stale"), AssetId::from_raw("1"));

        engine.clean_cache();

        assert_eq!(engine.db().cache.len(), 1);
        assert!(engine
            .db()
            .cache
            .get(&ContentFingerprint::from_raw("stale"))
            .is_none());
    }

    #[tokio::test]
    async fn display_name_uses_search_root_basename() {
        let fx = fixture().await;
        std::fs::create_dir_all(fx.temp.path().join("assets/ui")).unwrap();
        let path = write_asset(&fx, "ui/icon.png", b"x");
        let engine = engine_with(&fx.temp, fx.uploads.clone(), false).await;

        assert_eq!(engine.normalized_asset_path(&path), "assets/ui/icon.png");
    }

    #[test]
    fn truncation_keeps_tail_at_exact_limit() {
        let long = format!("assets/{}/texture.png", "x".repeat(80));
        let truncated = truncate_display_name(&long);

        assert_eq!(truncated.chars().count(), MAX_DISPLAY_NAME_LENGTH);
        assert!(truncated.starts_with(ELLIPSIS));
        assert!(long.ends_with(truncated.trim_start_matches(ELLIPSIS)));
        assert_ne!(truncated, long);

        let short = "assets/icon.png";
        assert_eq!(truncate_display_name(short), short);
    }

    #[tokio::test]
    async fn discover_files_sorted_and_recursive() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("b/nested")).unwrap();
        std::fs::write(temp.path().join("z.png"), b"1").unwrap();
        std::fs::write(temp.path().join("b/nested/a.png"), b"2").unwrap();

        let files = discover_files(temp.path()).await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("b/nested/a.png"));
        assert!(files[1].ends_with("z.png"));

        assert!(discover_files(&temp.path().join("missing")).await.is_err());
    }
}

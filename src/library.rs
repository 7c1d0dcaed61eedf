//! Namespaced asset libraries
//!
//! A library is a group of shared map entries keyed `namespace/assetName`.
//! Installing pulls every entry under a namespace into the local manifest as
//! `@namespace/assetName`; publishing pushes the files under the search path
//! into the shared map under the namespace. Libraries ride on asset ids
//! only, so installing never downloads or re-uploads content.

use crate::error::{SyncError, SyncResult};
use crate::fingerprint::ContentFingerprint;
use crate::remote::{SharedMapStore, SharedRecord};
use crate::sync::{self, SyncEngine};
use tracing::{info, warn};

/// Install every asset published under `namespace`
pub async fn install(
    engine: &mut SyncEngine,
    shared: &dyn SharedMapStore,
    namespace: &str,
) -> SyncResult<()> {
    let map = shared.fetch().await?;
    let prefix = format!("{namespace}/");

    let mut installed = 0usize;
    for (key, record) in &map {
        let Some(asset_name) = key.as_str().strip_prefix(&prefix) else {
            continue;
        };
        engine.db_mut().manifest.set_asset_key(
            format!("@{namespace}/{asset_name}"),
            record.asset_id.clone(),
        );
        installed += 1;
    }

    if installed == 0 {
        warn!("No assets found under @{namespace}");
        return Ok(());
    }

    info!("Installed {installed} assets from @{namespace}");
    engine.save().await
}

/// Publish the files under the search path as the `namespace` library.
///
/// Every file must already be synced; unsynced files are skipped with a
/// warning so a partial library is visible rather than silent.
pub async fn publish(
    engine: &SyncEngine,
    shared: &dyn SharedMapStore,
    namespace: &str,
) -> SyncResult<()> {
    if namespace.is_empty() || namespace.contains('/') {
        return Err(SyncError::User(format!(
            "invalid namespace \"{namespace}\": must be non-empty and contain no '/'"
        )));
    }

    let mut map = shared.fetch().await?;
    let files = sync::discover_files(engine.search_path()).await?;

    let mut published = 0usize;
    for file in &files {
        let Some(id) = engine.db().manifest.asset(file) else {
            warn!("Skipping unsynced file {}", file.display());
            continue;
        };
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        map.insert(
            ContentFingerprint::from_raw(format!("{namespace}/{file_name}")),
            SharedRecord {
                asset_id: id.clone(),
                path: format!("{namespace}/{file_name}"),
            },
        );
        published += 1;
    }

    if published == 0 {
        return Err(SyncError::User(format!(
            "nothing to publish under @{namespace}: run a sync first"
        )));
    }

    shared
        .publish(&map, &format!("Publish asset library for @{namespace}"))
        .await?;
    info!("Published {published} assets as @{namespace}");
    Ok(())
}

//! Shared map reconciliation
//!
//! Pull adopts remote fingerprint records into local state so independent
//! machines skip re-uploading content any of them has already pushed. Push
//! publishes the local view wholesale. Every remote failure here is logged
//! and swallowed; the shared map accelerates syncs but never gates them.

use crate::error::SyncResult;
use crate::remote::{SharedMap, SharedMapStore, SharedRecord};
use crate::sync::SyncEngine;
use tracing::{info, warn};

const PUSH_COMMIT_MESSAGE: &str = "Update asset map from rbxsync";

/// Merge remote records into the local cache and manifest.
///
/// Remote records win on divergence: a fingerprint is the same content, and
/// the freshest pushed id is as good as the local one.
pub async fn pull(engine: &mut SyncEngine, shared: &dyn SharedMapStore) {
    let map = match shared.fetch().await {
        Ok(map) => map,
        Err(e) => {
            warn!("Skipping shared map pull: {e}");
            return;
        }
    };

    let mut adopted = 0usize;
    for (fingerprint, record) in map {
        if engine.db().cache.get(&fingerprint).is_none() {
            adopted += 1;
        }
        engine
            .db_mut()
            .cache
            .set(fingerprint, record.asset_id.clone());
        engine
            .db_mut()
            .manifest
            .set_asset_key(record.path, record.asset_id);
    }

    if adopted > 0 {
        info!("Adopted {adopted} new asset ids from the shared map");
    }
}

/// Publish the local view of the shared map
pub async fn push(engine: &SyncEngine, shared: &dyn SharedMapStore) {
    let map = build_shared_map(engine);
    if let Err(e) = shared.publish(&map, PUSH_COMMIT_MESSAGE).await {
        warn!("Skipping shared map push: {e}");
    }
}

/// One full reconciliation pass: pull, persist, push
pub async fn run_pass(engine: &mut SyncEngine, shared: Option<&dyn SharedMapStore>) -> SyncResult<()> {
    if let Some(shared) = shared {
        pull(engine, shared).await;
    }
    engine.save().await?;
    if let Some(shared) = shared {
        push(engine, shared).await;
    }
    Ok(())
}

/// Join manifest path entries with their cache fingerprints.
///
/// Only path-mapped ids are published; cache-only entries carry no path for
/// the record and stay local.
fn build_shared_map(engine: &SyncEngine) -> SharedMap {
    let mut map = SharedMap::new();
    for (path, id) in engine.db().manifest.assets() {
        let fingerprint = engine
            .db()
            .cache
            .iter()
            .find(|(_, cached_id)| *cached_id == id)
            .map(|(fp, _)| fp.clone());
        if let Some(fingerprint) = fingerprint {
            map.insert(
                fingerprint,
                SharedRecord {
                    asset_id: id.clone(),
                    path: path.clone(),
                },
            );
        }
    }
    map
}

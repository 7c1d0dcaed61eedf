//! Continuous watch mode
//!
//! Filesystem events are handled immediately per file; a debounced quiet
//! period then triggers one full reconciliation pass. Ctrl-C starts a
//! graceful shutdown: drain, run a final pass under a hard timeout, exit.

use crate::config::WatchConfig;
use crate::error::{SyncError, SyncResult};
use crate::reconcile;
use crate::remote::SharedMapStore;
use crate::sync::SyncEngine;
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Far enough out to never fire on its own
const IDLE: Duration = Duration::from_secs(86400);

/// A filesystem change relevant to the sync engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Upsert(PathBuf),
    Remove(PathBuf),
}

/// Map a raw notify event to engine-level changes.
///
/// Create and modify events for directories are dropped; their contents
/// arrive as their own events. Remove events keep every path since the file
/// is already gone and cannot be probed.
pub fn classify_event(event: notify::Event) -> Vec<Change> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => event
            .paths
            .into_iter()
            .filter(|p| p.is_file())
            .map(Change::Upsert)
            .collect(),
        EventKind::Remove(_) => event.paths.into_iter().map(Change::Remove).collect(),
        _ => Vec::new(),
    }
}

/// Watch the search path until interrupted
pub async fn run(
    engine: &mut SyncEngine,
    shared: Option<&dyn SharedMapStore>,
    config: &WatchConfig,
) -> SyncResult<()> {
    run_until(engine, shared, config, tokio::signal::ctrl_c()).await
}

/// Watch loop with an injectable shutdown future.
///
/// The future is created by the caller and pinned once before the loop, so a
/// signal delivered while an event handler is running is observed on the
/// next `select!` instead of being dropped with a stale listener.
async fn run_until<S>(
    engine: &mut SyncEngine,
    shared: Option<&dyn SharedMapStore>,
    config: &WatchConfig,
    shutdown: S,
) -> SyncResult<()>
where
    S: std::future::Future<Output = std::io::Result<()>>,
{
    let root = engine.search_path().to_path_buf();
    if !root.exists() {
        return Err(SyncError::WatchPathMissing(root));
    }

    let debounce = Duration::from_millis(config.debounce_ms);
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);

    // Initial full pass so watch starts from a consistent state; pull first
    // so ids uploaded elsewhere are adopted instead of re-uploaded
    if let Some(shared) = shared {
        reconcile::pull(engine, shared).await;
    }
    engine.sync_all().await?;
    if let Some(shared) = shared {
        reconcile::push(engine, shared).await;
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
        if let Ok(event) = result {
            let _ = tx.send(event);
        }
    })?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("Watching {} (Ctrl-C to stop)", root.display());

    let timer = tokio::time::sleep(IDLE);
    tokio::pin!(timer);
    tokio::pin!(shutdown);
    let mut timer_armed = false;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down...");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                for change in classify_event(event) {
                    apply_change(engine, change).await;
                }
                timer.as_mut().reset(tokio::time::Instant::now() + debounce);
                timer_armed = true;
            }
            _ = &mut timer, if timer_armed => {
                timer_armed = false;
                timer.as_mut().reset(tokio::time::Instant::now() + IDLE);
                debug!("Quiet period elapsed, reconciling");
                if let Err(e) = reconcile::run_pass(engine, shared).await {
                    error!("Reconciliation failed: {e}");
                }
            }
        }
    }

    drop(watcher);

    // Drain events that arrived before the signal
    while let Ok(event) = rx.try_recv() {
        for change in classify_event(event) {
            apply_change(engine, change).await;
        }
    }

    match tokio::time::timeout(shutdown_timeout, reconcile::run_pass(engine, shared)).await {
        Ok(result) => result?,
        Err(_) => warn!(
            "Final reconciliation did not finish within {}s; exiting anyway",
            shutdown_timeout.as_secs()
        ),
    }

    Ok(())
}

async fn apply_change(engine: &mut SyncEngine, change: Change) {
    match change {
        Change::Upsert(path) => {
            if let Err(e) = engine.sync_one(&path).await {
                error!("Failed to sync {}: {e}", path.display());
            }
        }
        Change::Remove(path) => {
            debug!("File removed: {}", path.display());
            engine.unlink(&path);
        }
    }
    if let Err(e) = engine.save().await {
        error!("Failed to persist state: {e}");
    }
}
